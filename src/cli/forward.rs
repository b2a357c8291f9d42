use super::{load_aws_config, RunError};
use crate::config::{env_var, resolve_scheduled, ConfigError, Destination};
use crate::pipeline::{run_collection, RunSummary};
use crate::rds::{AwsRds, RdsApi};
use crate::sink::{AwsObjectStore, ObjectStore, S3Sink};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Scheduled collection of the last 24 hours into S3, configured from the
/// `SC_*` environment variables.
pub async fn forward(now: DateTime<Utc>) -> Result<RunSummary, RunError> {
    forward_with(env_var, now, |region| async move {
        let sdk_config = load_aws_config(&region).await;
        let store: Arc<dyn ObjectStore> = Arc::new(AwsObjectStore::new(&sdk_config));
        (AwsRds::new(&sdk_config), store)
    })
    .await
}

/// Resolve configuration, then build clients with `connect` and run.
///
/// `connect` receives the region and is only called once configuration is
/// complete, so a configuration error never reaches either service.
pub async fn forward_with<E, C, Fut, R>(
    lookup: E,
    now: DateTime<Utc>,
    connect: C,
) -> Result<RunSummary, RunError>
where
    E: Fn(&str) -> Option<String>,
    C: FnOnce(String) -> Fut,
    Fut: Future<Output = (R, Arc<dyn ObjectStore>)>,
    R: RdsApi,
{
    let config = resolve_scheduled(lookup, now)?;
    let (bucket, prefix) = match &config.destination {
        Destination::S3 { bucket, prefix } => (bucket.clone(), prefix.clone()),
        Destination::Local { .. } => {
            return Err(ConfigError::Validation(
                "scheduled runs write to an S3 bucket".to_string(),
            )
            .into())
        }
    };

    info!(
        region = %config.region,
        bucket = %bucket,
        clusters = ?config.clusters,
        "Starting scheduled collection"
    );
    let (rds, store) = connect(config.region.clone()).await;
    let mut sink = S3Sink::new(store, bucket, prefix);
    let summary = run_collection(&rds, &mut sink, &config.clusters, &config.window).await?;
    Ok(summary)
}
