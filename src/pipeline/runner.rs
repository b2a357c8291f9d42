use crate::error::{CollectError, Result};
use crate::rds::{get_log_data, list_instances, list_slow_logs, RdsApi, TimeWindow};
use crate::sink::LogSink;
use tracing::{info, warn};

/// Counters reported at the end of a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub instances: usize,
    pub skipped_instances: usize,
    pub located: usize,
    pub collected: usize,
    pub skipped_files: usize,
}

/// Run one collection pass: enumerate instances, locate their slow logs in
/// `window`, download each one and hand it to `sink`.
///
/// Only a failure to enumerate instances is returned as an error. Failures
/// for a single instance or log file are logged and that unit is skipped.
pub async fn run_collection<R, K>(
    rds: &R,
    sink: &mut K,
    clusters: &[String],
    window: &TimeWindow,
) -> Result<RunSummary>
where
    R: RdsApi + ?Sized,
    K: LogSink + ?Sized,
{
    let instances = list_instances(rds, clusters).await?;
    let mut summary = RunSummary {
        instances: instances.len(),
        ..Default::default()
    };

    for instance in &instances {
        let files = match list_slow_logs(rds, instance, window).await {
            Ok(files) => files,
            Err(e) => {
                warn!(
                    instance = %instance,
                    error = %e,
                    "Failed to list slow logs, skipping instance"
                );
                summary.skipped_instances += 1;
                continue;
            }
        };
        info!(instance = %instance, count = files.len(), "Located slow logs");
        summary.located += files.len();

        if let Err(e) = sink.begin_instance(instance).await {
            warn!(
                instance = %instance,
                error = %e,
                "Failed to prepare destination, skipping instance"
            );
            summary.skipped_instances += 1;
            summary.skipped_files += files.len();
            continue;
        }

        for file in &files {
            let content = match get_log_data(rds, &file.instance_id, &file.name).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        instance = %file.instance_id,
                        file = %file.name,
                        error = %e,
                        "Failed to download slow log, skipping"
                    );
                    summary.skipped_files += 1;
                    continue;
                }
            };

            match sink.write_log(file, content).await {
                Ok(()) => summary.collected += 1,
                Err(e @ CollectError::Parse { .. }) => {
                    warn!(
                        instance = %file.instance_id,
                        file = %file.name,
                        error = %e,
                        "Unrecognised log file name, skipping"
                    );
                    summary.skipped_files += 1;
                }
                Err(e) => {
                    warn!(
                        instance = %file.instance_id,
                        file = %file.name,
                        error = %e,
                        "Failed to store slow log, skipping"
                    );
                    summary.skipped_files += 1;
                }
            }
        }

        if let Err(e) = sink.finish_instance(instance).await {
            warn!(instance = %instance, error = %e, "Failed to finalise destination");
        }
    }

    info!(
        instances = summary.instances,
        skipped_instances = summary.skipped_instances,
        located = summary.located,
        collected = summary.collected,
        skipped_files = summary.skipped_files,
        "Collection run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeObjectStore, FakeRds};
    use crate::rds::LogFileEntry;
    use crate::sink::S3Sink;
    use std::sync::Arc;

    fn entry(name: &str) -> LogFileEntry {
        LogFileEntry {
            name: Some(name.to_string()),
            last_written: None,
            size: Some(10),
        }
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let rds = FakeRds::new().fail_instances_at(0);
        let store = Arc::new(FakeObjectStore::new());
        let mut sink = S3Sink::new(store.clone(), "archive", "slowquery");

        let err = run_collection(&rds, &mut sink, &[], &TimeWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Service { .. }));
        assert!(store.objects().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_skips_only_that_instance() {
        let good = "slowquery/mysql-slowquery.log.2023-06-15.04";
        let rds = FakeRds::new()
            .with_instance_pages(vec![vec!["db-1", "db-2"]])
            .fail_log_listing("db-1")
            .with_log_pages("db-2", vec![vec![entry(good)]])
            .with_log_data("db-2", good, vec![Some("SELECT 1;\n")]);
        let store = Arc::new(FakeObjectStore::new());
        let mut sink = S3Sink::new(store.clone(), "archive", "slowquery");

        let summary = run_collection(&rds, &mut sink, &[], &TimeWindow::default())
            .await
            .unwrap();

        assert_eq!(summary.instances, 2);
        assert_eq!(summary.skipped_instances, 1);
        assert_eq!(summary.collected, 1);
        assert_eq!(store.objects()[0].key, "slowquery/db-2/2023/06/15/04.log");
    }

    #[tokio::test]
    async fn test_unparseable_name_and_upload_failure_are_skipped() {
        let bad_name = "slowquery/mysql-slowquery.log.latest";
        let rejected = "slowquery/mysql-slowquery.log.2023-06-15.05";
        let good = "slowquery/mysql-slowquery.log.2023-06-15.06";
        let rds = FakeRds::new()
            .with_instance_pages(vec![vec!["db-1"]])
            .with_log_pages(
                "db-1",
                vec![vec![entry(bad_name), entry(rejected), entry(good)]],
            )
            .with_log_data("db-1", bad_name, vec![Some("a")])
            .with_log_data("db-1", rejected, vec![Some("b")])
            .with_log_data("db-1", good, vec![Some("c")]);
        let store = Arc::new(FakeObjectStore::new().fail_key("slowquery/db-1/2023/06/15/05.log"));
        let mut sink = S3Sink::new(store.clone(), "archive", "slowquery");

        let summary = run_collection(&rds, &mut sink, &[], &TimeWindow::default())
            .await
            .unwrap();

        assert_eq!(summary.located, 3);
        assert_eq!(summary.collected, 1);
        assert_eq!(summary.skipped_files, 2);
        let keys: Vec<String> = store.objects().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["slowquery/db-1/2023/06/15/06.log"]);
    }
}
