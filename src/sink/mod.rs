pub mod key;
pub mod local;
pub mod s3;

use crate::error::Result;
use crate::rds::SlowLogFile;
use async_trait::async_trait;

pub use key::derive_time_key;
pub use local::{filter_log_lines, LocalSink};
pub use s3::{AwsObjectStore, ObjectStore, S3Sink, StorageTier};

/// Destination for downloaded log content.
///
/// The pipeline calls `begin_instance` once before the first log of an
/// instance and `finish_instance` once after its last log.
#[async_trait]
pub trait LogSink: Send {
    async fn begin_instance(&mut self, _instance: &str) -> Result<()> {
        Ok(())
    }

    async fn write_log(&mut self, file: &SlowLogFile, content: String) -> Result<()>;

    async fn finish_instance(&mut self, _instance: &str) -> Result<()> {
        Ok(())
    }
}
