use super::{load_aws_config, RunError};
use crate::config::{
    env_var, load_config, resolve_one_shot, CollectorConfig, ConfigError, Destination, Overrides,
};
use crate::pipeline::{run_collection, RunSummary};
use crate::rds::{AwsRds, RdsApi};
use crate::sink::LocalSink;
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Directory to put log files in
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Start of the collection window, UTC (YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub start: Option<String>,

    /// End of the collection window, UTC (YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub end: Option<String>,

    /// Cluster to collect slow query logs from; repeatable
    #[arg(long = "cluster", value_name = "CLUSTER")]
    pub clusters: Vec<String>,

    /// AWS region, defaults to AWS_REGION or AWS_DEFAULT_REGION
    #[arg(long)]
    pub region: Option<String>,
}

impl From<RunArgs> for Overrides {
    fn from(args: RunArgs) -> Self {
        Overrides {
            region: args.region,
            dir: args.dir,
            clusters: args.clusters,
            start: args.start,
            end: args.end,
        }
    }
}

/// One-shot collection into a local directory.
pub async fn run(config_path: Option<PathBuf>, args: RunArgs) -> Result<RunSummary, RunError> {
    let started = Utc::now();

    let file = match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            Some(load_config(&path, env_var)?)
        }
        None => None,
    };
    let config = resolve_one_shot(file, args.into(), env_var, started)?;

    info!(region = %config.region, "Connecting to AWS");
    let sdk_config = load_aws_config(&config.region).await;
    let rds = AwsRds::new(&sdk_config);

    collect_to_directory(&config, &rds, started).await
}

/// Run the pipeline against `rds`, writing one file per instance under the
/// configured directory.
pub async fn collect_to_directory<R>(
    config: &CollectorConfig,
    rds: &R,
    started: DateTime<Utc>,
) -> Result<RunSummary, RunError>
where
    R: RdsApi + ?Sized,
{
    let dir = match &config.destination {
        Destination::Local { dir } => dir,
        Destination::S3 { .. } => {
            return Err(ConfigError::Validation(
                "one-shot runs write to a local directory".to_string(),
            )
            .into())
        }
    };

    info!(
        dir = %dir.display(),
        clusters = ?config.clusters,
        start = ?config.window.start,
        end = ?config.window.end,
        "Starting one-shot collection"
    );
    let mut sink = LocalSink::new(dir, started);
    let summary = run_collection(rds, &mut sink, &config.clusters, &config.window).await?;
    Ok(summary)
}
