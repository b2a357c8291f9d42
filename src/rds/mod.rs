pub mod client;
pub mod instances;
pub mod logs;
pub mod pages;

use crate::error::Result;
use async_trait::async_trait;

pub use client::AwsRds;
pub use instances::list_instances;
pub use logs::{get_log_data, list_slow_logs, SlowLogFile, TimeWindow, SLOW_LOG_PREFIX};
pub use pages::{Page, Pages};

/// Filter sent with a log file listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileQuery {
    pub instance: String,
    pub filename_contains: String,
    /// Epoch milliseconds; the service omits files last written before it.
    pub modified_after: Option<i64>,
    pub min_size: i64,
}

/// One log file entry as reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFileEntry {
    pub name: Option<String>,
    /// Epoch milliseconds.
    pub last_written: Option<i64>,
    pub size: Option<i64>,
}

/// Calls the collector needs from the managed database control plane.
///
/// Paged calls take the marker returned by the previous page (`None` for the
/// first page) and return the next marker, `None` once the listing is done.
#[async_trait]
pub trait RdsApi: Send + Sync {
    /// Instance identifiers of every member of one cluster.
    async fn describe_cluster_members(&self, cluster: &str) -> Result<Vec<String>>;

    async fn describe_instances(&self, marker: Option<String>) -> Result<Page<String>>;

    async fn describe_log_files(
        &self,
        query: &LogFileQuery,
        marker: Option<String>,
    ) -> Result<Page<LogFileEntry>>;

    /// One portion of a log file. The page holds zero or one text fragment.
    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>>;
}
