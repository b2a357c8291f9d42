use super::key::derive_time_key;
use super::LogSink;
use crate::error::{CollectError, Result};
use crate::rds::SlowLogFile;
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::error::DisplayErrorContext;
use s3::primitives::ByteStream;
use s3::types::StorageClass;
use std::sync::Arc;
use tracing::info;

/// Storage class requested for uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Standard,
    InfrequentAccess,
}

impl From<StorageTier> for StorageClass {
    fn from(tier: StorageTier) -> Self {
        match tier {
            StorageTier::Standard => StorageClass::Standard,
            StorageTier::InfrequentAccess => StorageClass::StandardIa,
        }
    }
}

/// Write-only view of an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: String,
        tier: StorageTier,
    ) -> Result<()>;
}

/// [`ObjectStore`] backed by S3.
#[derive(Debug, Clone)]
pub struct AwsObjectStore {
    client: s3::Client,
}

impl AwsObjectStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: String,
        tier: StorageTier,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.into_bytes()))
            .storage_class(tier.into())
            .send()
            .await
            .map_err(|e| CollectError::service("PutObject", DisplayErrorContext(&e)))?;
        Ok(())
    }
}

/// Uploads every log file verbatim to `{prefix}/{instance}/{YYYY/MM/DD/HH}.log`.
pub struct S3Sink {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl S3Sink {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_key(&self, file: &SlowLogFile) -> Result<String> {
        let time_key = derive_time_key(file)?;
        Ok(format!("{}/{}/{}.log", self.prefix, file.instance_id, time_key))
    }

    pub async fn put_log_file(&self, content: String, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CollectError::Validation("object key is empty".to_string()));
        }
        self.store
            .put_object(&self.bucket, key, content, StorageTier::InfrequentAccess)
            .await
    }
}

#[async_trait]
impl LogSink for S3Sink {
    async fn write_log(&mut self, file: &SlowLogFile, content: String) -> Result<()> {
        let key = self.object_key(file)?;
        let bytes = content.len();
        self.put_log_file(content, &key).await?;
        info!(bucket = %self.bucket, key = %key, bytes, "Uploaded slow log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeObjectStore;

    fn file(instance: &str, name: &str) -> SlowLogFile {
        SlowLogFile {
            instance_id: instance.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_log_uploads_verbatim_with_hourly_key() {
        let store = Arc::new(FakeObjectStore::new());
        let mut sink = S3Sink::new(store.clone(), "archive", "slowquery");
        let content = "Time  Id Command\nSELECT 1;\n".to_string();

        sink.write_log(
            &file("db-1", "slowquery/mysql-slowquery.log.2023-06-15.04"),
            content.clone(),
        )
        .await
        .unwrap();

        let objects = store.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bucket, "archive");
        assert_eq!(objects[0].key, "slowquery/db-1/2023/06/15/04.log");
        assert_eq!(objects[0].body, content);
        assert_eq!(objects[0].tier, StorageTier::InfrequentAccess);
    }

    #[tokio::test]
    async fn test_write_log_parse_failure_uploads_nothing() {
        let store = Arc::new(FakeObjectStore::new());
        let mut sink = S3Sink::new(store.clone(), "archive", "slowquery");

        let err = sink
            .write_log(&file("db-1", "slowquery/mysql-slowquery.log"), "x".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Parse { .. }));
        assert!(store.objects().is_empty());
    }

    #[tokio::test]
    async fn test_put_log_file_rejects_empty_key() {
        let store = Arc::new(FakeObjectStore::new());
        let sink = S3Sink::new(store.clone(), "archive", "slowquery");

        let err = sink.put_log_file("x".to_string(), "").await.unwrap_err();
        assert!(matches!(err, CollectError::Validation(_)));
    }

    #[test]
    fn test_infrequent_access_maps_to_standard_ia() {
        assert_eq!(StorageClass::from(StorageTier::InfrequentAccess), StorageClass::StandardIa);
    }
}
