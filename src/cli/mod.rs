pub mod config;
pub mod forward;
pub mod run;

use crate::config::ConfigError;
use crate::error::CollectError;
use aws_config::{BehaviorVersion, Region};
use thiserror::Error;

/// Errors that end a run before or during instance enumeration.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("collection failed: {0}")]
    Collect(#[from] CollectError),
}

/// Load shared AWS settings (credentials chain, retry defaults) for `region`.
pub async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
