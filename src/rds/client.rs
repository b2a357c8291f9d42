use super::{LogFileEntry, LogFileQuery, Page, RdsApi};
use crate::error::{CollectError, Result};
use async_trait::async_trait;
use aws_sdk_rds as rds;
use rds::error::DisplayErrorContext;

/// [`RdsApi`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsRds {
    client: rds::Client,
}

impl AwsRds {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: rds::Client::new(config),
        }
    }
}

#[async_trait]
impl RdsApi for AwsRds {
    async fn describe_cluster_members(&self, cluster: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(cluster)
            .send()
            .await
            .map_err(|e| CollectError::service("DescribeDBClusters", DisplayErrorContext(&e)))?;

        Ok(output
            .db_clusters()
            .iter()
            .flat_map(|c| c.db_cluster_members())
            .filter_map(|m| m.db_instance_identifier().map(str::to_string))
            .collect())
    }

    async fn describe_instances(&self, marker: Option<String>) -> Result<Page<String>> {
        let output = self
            .client
            .describe_db_instances()
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| CollectError::service("DescribeDBInstances", DisplayErrorContext(&e)))?;

        let instances = output
            .db_instances()
            .iter()
            .filter_map(|i| i.db_instance_identifier().map(str::to_string))
            .collect();
        Ok(Page::new(instances, output.marker().map(str::to_string)))
    }

    async fn describe_log_files(
        &self,
        query: &LogFileQuery,
        marker: Option<String>,
    ) -> Result<Page<LogFileEntry>> {
        let output = self
            .client
            .describe_db_log_files()
            .db_instance_identifier(&query.instance)
            .filename_contains(&query.filename_contains)
            .file_size(query.min_size)
            .set_file_last_written(query.modified_after)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| CollectError::service("DescribeDBLogFiles", DisplayErrorContext(&e)))?;

        let entries = output
            .describe_db_log_files()
            .iter()
            .map(|f| LogFileEntry {
                name: f.log_file_name().map(str::to_string),
                last_written: f.last_written(),
                size: f.size(),
            })
            .collect();
        Ok(Page::new(entries, output.marker().map(str::to_string)))
    }

    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .download_db_log_file_portion()
            .db_instance_identifier(instance)
            .log_file_name(file_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| {
                CollectError::service("DownloadDBLogFilePortion", DisplayErrorContext(&e))
            })?;

        // The service keeps returning a marker at the end of the file and
        // signals completion through AdditionalDataPending instead.
        let next = match output.additional_data_pending() {
            Some(false) => None,
            _ => output.marker().map(str::to_string),
        };
        let data = output.log_file_data().map(str::to_string).into_iter().collect();
        Ok(Page::new(data, next))
    }
}
