use super::{LogFileQuery, Pages, RdsApi};
use crate::error::{CollectError, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Name prefix shared by every MySQL slow-query log file.
pub const SLOW_LOG_PREFIX: &str = "slowquery/mysql-slowquery.log.";

/// A slow-query log file known to the control plane for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowLogFile {
    pub instance_id: String,
    pub name: String,
}

/// Bounds on the last-written time of the log files to collect.
/// An unset bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// The window covering the given number of hours up to `now`.
    pub fn trailing_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: Some(now - chrono::Duration::hours(hours)),
            end: Some(now),
        }
    }

    fn start_millis(&self) -> Option<i64> {
        self.start.map(|t| t.timestamp_millis())
    }

    fn end_millis(&self) -> Option<i64> {
        self.end.map(|t| t.timestamp_millis())
    }
}

/// List the slow-query log files of `instance` last written inside `window`.
///
/// The lower bound is applied by the service; the upper bound is applied to
/// each page as it arrives. Entries without a last-written time are kept.
pub async fn list_slow_logs<R>(
    api: &R,
    instance: &str,
    window: &TimeWindow,
) -> Result<Vec<SlowLogFile>>
where
    R: RdsApi + ?Sized,
{
    if instance.is_empty() {
        return Err(CollectError::Validation("instance id is empty".to_string()));
    }

    let query = LogFileQuery {
        instance: instance.to_string(),
        filename_contains: SLOW_LOG_PREFIX.to_string(),
        modified_after: window.start_millis(),
        min_size: 0,
    };
    let query = &query;
    let end = window.end_millis();

    let mut pages = Pages::new(|marker| api.describe_log_files(query, marker));
    let mut files = Vec::new();
    while let Some(page) = pages.next_page().await {
        for entry in page? {
            if let (Some(end), Some(written)) = (end, entry.last_written) {
                if written > end {
                    continue;
                }
            }
            match entry.name {
                Some(name) => files.push(SlowLogFile {
                    instance_id: instance.to_string(),
                    name,
                }),
                None => debug!(instance = %instance, "Skipping log file entry without a name"),
            }
        }
    }

    Ok(files)
}

/// Download the full text of one log file, joining every portion in order.
pub async fn get_log_data<R>(api: &R, instance: &str, file_name: &str) -> Result<String>
where
    R: RdsApi + ?Sized,
{
    if instance.is_empty() {
        return Err(CollectError::Validation("instance id is empty".to_string()));
    }
    if file_name.is_empty() {
        return Err(CollectError::Validation("log file name is empty".to_string()));
    }

    let mut pages = Pages::new(|marker| api.download_log_portion(instance, file_name, marker));
    let mut data = String::new();
    while let Some(page) = pages.next_page().await {
        for fragment in page? {
            data.push_str(&fragment);
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeRds;
    use crate::rds::LogFileEntry;
    use chrono::TimeZone;

    fn entry(name: &str, last_written: Option<i64>) -> LogFileEntry {
        LogFileEntry {
            name: Some(name.to_string()),
            last_written,
            size: Some(0),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 15, hour, 0, 0).unwrap()
    }

    fn ms(hour: u32) -> i64 {
        at(hour).timestamp_millis()
    }

    #[tokio::test]
    async fn test_list_slow_logs_rejects_empty_instance() {
        let rds = FakeRds::new();
        let err = list_slow_logs(&rds, "", &TimeWindow::default()).await.unwrap_err();
        assert!(matches!(err, CollectError::Validation(_)));
        assert!(rds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_slow_logs_sends_service_side_filter() {
        let rds = FakeRds::new().with_log_pages("db-1", vec![vec![]]);
        let window = TimeWindow::new(Some(at(2)), None);

        list_slow_logs(&rds, "db-1", &window).await.unwrap();

        let queries = rds.log_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].instance, "db-1");
        assert_eq!(queries[0].filename_contains, SLOW_LOG_PREFIX);
        assert_eq!(queries[0].modified_after, Some(ms(2)));
        assert_eq!(queries[0].min_size, 0);
    }

    #[tokio::test]
    async fn test_list_slow_logs_without_start_has_no_lower_bound() {
        let rds = FakeRds::new().with_log_pages(
            "db-1",
            vec![vec![entry("slowquery/mysql-slowquery.log.2023-06-15.00", Some(ms(0)))]],
        );

        let files = list_slow_logs(&rds, "db-1", &TimeWindow::default()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(rds.log_queries()[0].modified_after, None);
    }

    #[tokio::test]
    async fn test_list_slow_logs_drops_entries_after_end() {
        let rds = FakeRds::new().with_log_pages(
            "db-1",
            vec![
                vec![
                    entry("slowquery/mysql-slowquery.log.2023-06-15.01", Some(ms(1))),
                    entry("slowquery/mysql-slowquery.log.2023-06-15.05", Some(ms(5))),
                ],
                vec![
                    entry("slowquery/mysql-slowquery.log.2023-06-15.03", Some(ms(3))),
                    entry("slowquery/mysql-slowquery.log.unknown", None),
                ],
            ],
        );
        let window = TimeWindow::new(Some(at(1)), Some(at(3)));

        let files = list_slow_logs(&rds, "db-1", &window).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "slowquery/mysql-slowquery.log.2023-06-15.01",
                "slowquery/mysql-slowquery.log.2023-06-15.03",
                "slowquery/mysql-slowquery.log.unknown",
            ]
        );
        assert!(files.iter().all(|f| f.instance_id == "db-1"));
    }

    #[tokio::test]
    async fn test_list_slow_logs_service_error_aborts() {
        let rds = FakeRds::new().fail_log_listing("db-1");
        let err = list_slow_logs(&rds, "db-1", &TimeWindow::default()).await.unwrap_err();
        assert!(matches!(err, CollectError::Service { .. }));
    }

    #[tokio::test]
    async fn test_get_log_data_validates_arguments() {
        let rds = FakeRds::new();
        assert!(matches!(
            get_log_data(&rds, "", "file").await,
            Err(CollectError::Validation(_))
        ));
        assert!(matches!(
            get_log_data(&rds, "db-1", "").await,
            Err(CollectError::Validation(_))
        ));
        assert!(rds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_log_data_concatenates_portions() {
        let rds = FakeRds::new().with_log_data(
            "db-1",
            "slowquery/mysql-slowquery.log.2023-06-15.04",
            vec![Some("SELECT 1;\n"), None, Some("SELECT 2;\n")],
        );

        let data = get_log_data(&rds, "db-1", "slowquery/mysql-slowquery.log.2023-06-15.04")
            .await
            .unwrap();
        assert_eq!(data, "SELECT 1;\nSELECT 2;\n");
    }

    #[tokio::test]
    async fn test_get_log_data_error_returns_no_partial_content() {
        let rds = FakeRds::new()
            .with_log_data("db-1", "f", vec![Some("partial"), Some("rest")])
            .fail_download_at("db-1", "f", 1);

        let err = get_log_data(&rds, "db-1", "f").await.unwrap_err();
        assert!(matches!(err, CollectError::Service { .. }));
    }
}
