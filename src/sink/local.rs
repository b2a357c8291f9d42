use super::LogSink;
use crate::error::{CollectError, Result};
use crate::rds::SlowLogFile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Header lines the database service writes into every slow log.
pub const NOISE_PREFIXES: [&str; 3] = ["/rdsdbbin/oscar", "Tcp port:", "Time"];

/// Drop service header lines, keeping every other line newline-terminated.
pub fn filter_log_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if NOISE_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

struct OpenFile {
    instance: String,
    path: PathBuf,
    file: File,
}

/// Appends every log of an instance collected in one run to
/// `{root}/{instance}/{run stamp}.log`, stripped of service headers.
pub struct LocalSink {
    root: PathBuf,
    run_stamp: String,
    current: Option<OpenFile>,
}

impl LocalSink {
    pub fn new(root: impl Into<PathBuf>, started: DateTime<Utc>) -> Self {
        Self {
            root: root.into(),
            run_stamp: started.format("%Y%m%d%H%M").to_string(),
            current: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instance_path(&self, instance: &str) -> PathBuf {
        self.root
            .join(instance)
            .join(format!("{}.log", self.run_stamp))
    }

    async fn close_current(&mut self) -> Result<()> {
        if let Some(mut open) = self.current.take() {
            open.file
                .flush()
                .await
                .map_err(|e| CollectError::io(open.path.display().to_string(), e))?;
            debug!(instance = %open.instance, path = %open.path.display(), "Closed output file");
        }
        Ok(())
    }
}

#[async_trait]
impl LogSink for LocalSink {
    async fn begin_instance(&mut self, instance: &str) -> Result<()> {
        self.close_current().await?;

        let dir = self.root.join(instance);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CollectError::io(dir.display().to_string(), e))?;

        let path = self.instance_path(instance);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| CollectError::io(path.display().to_string(), e))?;

        info!(instance = %instance, path = %path.display(), "Opened output file");
        self.current = Some(OpenFile {
            instance: instance.to_string(),
            path,
            file,
        });
        Ok(())
    }

    async fn write_log(&mut self, file: &SlowLogFile, content: String) -> Result<()> {
        let open = match self.current.as_mut() {
            Some(open) if open.instance == file.instance_id => open,
            _ => {
                return Err(CollectError::Validation(format!(
                    "no output file open for instance {}",
                    file.instance_id
                )))
            }
        };

        let filtered = filter_log_lines(&content);
        // Flushed per log so a failed write is reported against that log
        let written = match open.file.write_all(filtered.as_bytes()).await {
            Ok(()) => open.file.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| CollectError::io(open.path.display().to_string(), e))?;
        debug!(
            instance = %file.instance_id,
            file = %file.name,
            bytes = filtered.len(),
            "Appended slow log"
        );
        Ok(())
    }

    async fn finish_instance(&mut self, _instance: &str) -> Result<()> {
        self.close_current().await
    }
}
