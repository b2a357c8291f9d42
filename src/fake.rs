//! In-memory stand-ins for the control plane and object storage, used by the
//! test suites to drive the pipeline without AWS.

use crate::error::{CollectError, Result};
use crate::rds::{LogFileEntry, LogFileQuery, Page, RdsApi};
use crate::sink::{ObjectStore, StorageTier};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

fn page_marker(index: usize, total: usize) -> Option<String> {
    if index + 1 < total {
        Some(format!("page-{}", index + 1))
    } else {
        None
    }
}

fn page_index(marker: Option<&str>) -> usize {
    marker
        .and_then(|m| m.strip_prefix("page-"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Scripted control plane. Every paged listing is served page by page with
/// markers of the form `page-N`.
#[derive(Debug, Default)]
pub struct FakeRds {
    clusters: HashMap<String, Vec<String>>,
    instance_pages: Vec<Vec<String>>,
    log_pages: HashMap<String, Vec<Vec<LogFileEntry>>>,
    log_data: HashMap<(String, String), Vec<Option<String>>>,
    // operation key -> first failing page
    failures: HashMap<String, usize>,
    calls: Mutex<Vec<String>>,
    queries: Mutex<Vec<LogFileQuery>>,
}

impl FakeRds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, cluster: &str, members: &[&str]) -> Self {
        self.clusters.insert(
            cluster.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn with_instance_pages(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.instance_pages = pages
            .into_iter()
            .map(|p| p.into_iter().map(str::to_string).collect())
            .collect();
        self
    }

    pub fn with_log_pages(mut self, instance: &str, pages: Vec<Vec<LogFileEntry>>) -> Self {
        self.log_pages.insert(instance.to_string(), pages);
        self
    }

    pub fn with_log_data(
        mut self,
        instance: &str,
        file: &str,
        fragments: Vec<Option<&str>>,
    ) -> Self {
        self.log_data.insert(
            (instance.to_string(), file.to_string()),
            fragments.into_iter().map(|f| f.map(str::to_string)).collect(),
        );
        self
    }

    pub fn fail_cluster(mut self, cluster: &str) -> Self {
        self.failures.insert(format!("cluster:{cluster}"), 0);
        self
    }

    pub fn fail_instances_at(mut self, page: usize) -> Self {
        self.failures.insert("instances".to_string(), page);
        self
    }

    pub fn fail_log_listing(mut self, instance: &str) -> Self {
        self.failures.insert(format!("logs:{instance}"), 0);
        self
    }

    pub fn fail_download(self, instance: &str, file: &str) -> Self {
        self.fail_download_at(instance, file, 0)
    }

    pub fn fail_download_at(mut self, instance: &str, file: &str, page: usize) -> Self {
        self.failures.insert(format!("download:{instance}:{file}"), page);
        self
    }

    /// Every call made so far, as `operation:args` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn log_queries(&self) -> Vec<LogFileQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check(&self, key: &str, operation: &'static str, page: usize) -> Result<()> {
        match self.failures.get(key) {
            Some(&from) if page >= from => Err(CollectError::service(
                operation,
                format!("injected failure for {key}"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RdsApi for FakeRds {
    async fn describe_cluster_members(&self, cluster: &str) -> Result<Vec<String>> {
        self.record(format!("describe_cluster:{cluster}"));
        self.check(&format!("cluster:{cluster}"), "DescribeDBClusters", 0)?;
        self.clusters.get(cluster).cloned().ok_or_else(|| {
            CollectError::service(
                "DescribeDBClusters",
                format!("DBClusterNotFoundFault: {cluster}"),
            )
        })
    }

    async fn describe_instances(&self, marker: Option<String>) -> Result<Page<String>> {
        let index = page_index(marker.as_deref());
        self.record(format!("describe_instances:{index}"));
        self.check("instances", "DescribeDBInstances", index)?;
        let items = self.instance_pages.get(index).cloned().unwrap_or_default();
        Ok(Page::new(items, page_marker(index, self.instance_pages.len())))
    }

    async fn describe_log_files(
        &self,
        query: &LogFileQuery,
        marker: Option<String>,
    ) -> Result<Page<LogFileEntry>> {
        let index = page_index(marker.as_deref());
        self.record(format!("describe_log_files:{}:{index}", query.instance));
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        self.check(&format!("logs:{}", query.instance), "DescribeDBLogFiles", index)?;

        let pages = self.log_pages.get(&query.instance);
        let total = pages.map_or(0, Vec::len);
        let items = pages
            .and_then(|p| p.get(index))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|e| match e.name.as_deref() {
                Some(name) => name.contains(&query.filename_contains),
                None => true,
            })
            .filter(|e| match (query.modified_after, e.last_written) {
                (Some(after), Some(written)) => written >= after,
                _ => true,
            })
            .filter(|e| e.size.unwrap_or(0) >= query.min_size)
            .collect();
        Ok(Page::new(items, page_marker(index, total)))
    }

    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>> {
        let index = page_index(marker.as_deref());
        self.record(format!("download:{instance}:{file_name}:{index}"));
        self.check(
            &format!("download:{instance}:{file_name}"),
            "DownloadDBLogFilePortion",
            index,
        )?;

        let fragments = self
            .log_data
            .get(&(instance.to_string(), file_name.to_string()))
            .ok_or_else(|| {
                CollectError::service(
                    "DownloadDBLogFilePortion",
                    format!("DBLogFileNotFoundFault: {file_name}"),
                )
            })?;
        let items = fragments.get(index).cloned().flatten().into_iter().collect();
        Ok(Page::new(items, page_marker(index, fragments.len())))
    }
}

/// One object written to [`FakeObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: String,
    pub tier: StorageTier,
}

/// Object store that keeps every write in memory.
#[derive(Debug, Default)]
pub struct FakeObjectStore {
    failing_keys: HashSet<String>,
    objects: Mutex<Vec<StoredObject>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: String,
        tier: StorageTier,
    ) -> Result<()> {
        if self.failing_keys.contains(key) {
            return Err(CollectError::service("PutObject", format!("AccessDenied: {key}")));
        }
        if let Ok(mut objects) = self.objects.lock() {
            objects.push(StoredObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
                tier,
            });
        }
        Ok(())
    }
}
