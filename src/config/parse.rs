use super::types::*;
use crate::config::{expand_env_vars_with, expand_tilde, UNEXPANDED_VAR};
use crate::rds::TimeWindow;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Region variables consulted by the one-shot collector, in order.
pub const ONE_SHOT_REGION_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];
pub const SCHEDULED_REGION_VAR: &str = "SC_AWS_REGION";
pub const SCHEDULED_BUCKET_VAR: &str = "SC_S3_BUCKET";
pub const SCHEDULED_CLUSTERS_VAR: &str = "SC_CLUSTERS";

/// Hours covered by a scheduled run, ending at the time it starts.
pub const SCHEDULED_WINDOW_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("{0} required")]
    Missing(String),

    #[error("invalid {field}: {reason}")]
    InvalidTime { field: &'static str, reason: String },

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Read and parse a YAML config file, expanding `$env{VAR}` references and
/// `~` in paths.
pub fn load_config<F>(path: &Path, lookup: F) -> Result<FileConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string, lookup).map_err(|e| match e {
        ConfigError::YamlParse(inner) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), inner),
        )),
        other => other,
    })
}

pub fn parse_config<F>(yaml: &str, lookup: F) -> Result<FileConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let yaml = expand_env_vars_with(yaml, &lookup);
    check_unexpanded_vars(&yaml)?;

    let mut config: FileConfig = serde_yaml::from_str(&yaml)?;
    if let Some(SinkConfig::Local { dir }) = config.sink.as_mut() {
        *dir = expand_tilde(dir);
    }
    Ok(config)
}

fn check_unexpanded_vars(yaml: &str) -> Result<(), ConfigError> {
    let re = Regex::new(UNEXPANDED_VAR).map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut vars: Vec<&str> = re
        .captures_iter(yaml)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    if vars.is_empty() {
        return Ok(());
    }
    vars.sort_unstable();
    vars.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         Set them or replace the $env{{...}} references in the config file",
        vars.join(", ")
    )))
}

/// Settings for a one-shot run that writes to a local directory.
///
/// Flags win over the config file; the region falls back to `AWS_REGION`
/// and then `AWS_DEFAULT_REGION`. Without explicit bounds the window is the
/// 24 hours before `now`.
pub fn resolve_one_shot<F>(
    file: Option<FileConfig>,
    overrides: Overrides,
    lookup: F,
    now: DateTime<Utc>,
) -> Result<CollectorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = file.unwrap_or_default();

    let file_dir = match file.sink {
        Some(SinkConfig::Local { dir }) => Some(dir),
        Some(SinkConfig::S3 { .. }) => {
            return Err(ConfigError::Validation(
                "one-shot runs write to a local directory".to_string(),
            ))
        }
        None => None,
    };
    let dir = overrides.dir.or(file_dir);
    let dir = dir
        .filter(|d| !d.as_os_str().is_empty())
        .ok_or_else(|| ConfigError::Missing("dir".to_string()))?;

    let start = match overrides.start.as_deref() {
        Some(value) => Some(parse_time("start", value)?),
        None => file.window.start,
    }
    .unwrap_or(now - chrono::Duration::hours(SCHEDULED_WINDOW_HOURS));
    let end = match overrides.end.as_deref() {
        Some(value) => Some(parse_time("end", value)?),
        None => file.window.end,
    }
    .unwrap_or(now);

    let region = overrides
        .region
        .or(file.aws.region)
        .filter(|r| !r.is_empty())
        .or_else(|| ONE_SHOT_REGION_VARS.iter().find_map(|var| non_empty(&lookup, var)))
        .ok_or_else(|| {
            ConfigError::Missing(format!(
                "env {} or {}",
                ONE_SHOT_REGION_VARS[0], ONE_SHOT_REGION_VARS[1]
            ))
        })?;

    let clusters = if overrides.clusters.is_empty() {
        file.clusters
    } else {
        overrides.clusters
    };

    let config = CollectorConfig {
        region,
        clusters,
        window: TimeWindow::new(Some(start), Some(end)),
        destination: Destination::Local {
            dir: expand_tilde(&dir),
        },
    };
    validate(&config)?;
    Ok(config)
}

/// Settings for a scheduled run, read from `SC_*` environment variables.
/// The window always covers the 24 hours before `now`.
pub fn resolve_scheduled<F>(lookup: F, now: DateTime<Utc>) -> Result<CollectorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let region = non_empty(&lookup, SCHEDULED_REGION_VAR)
        .ok_or_else(|| ConfigError::Missing(format!("env {}", SCHEDULED_REGION_VAR)))?;
    let bucket = non_empty(&lookup, SCHEDULED_BUCKET_VAR)
        .ok_or_else(|| ConfigError::Missing(format!("env {}", SCHEDULED_BUCKET_VAR)))?;
    let clusters = non_empty(&lookup, SCHEDULED_CLUSTERS_VAR)
        .map(|v| split_list(&v))
        .unwrap_or_default();

    let config = CollectorConfig {
        region,
        clusters,
        window: TimeWindow::trailing_hours(now, SCHEDULED_WINDOW_HOURS),
        destination: Destination::S3 {
            bucket,
            prefix: default_key_prefix(),
        },
    };
    validate(&config)?;
    Ok(config)
}

pub fn parse_time(field: &'static str, value: &str) -> Result<DateTime<Utc>, ConfigError> {
    utc_time::parse(value.trim()).map_err(|reason| ConfigError::InvalidTime { field, reason })
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate(config: &CollectorConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.region.trim().is_empty() {
        errors.push("region must not be empty".to_string());
    }
    for cluster in &config.clusters {
        if cluster.trim().is_empty() {
            errors.push("cluster identifiers must not be empty".to_string());
        }
    }
    match &config.destination {
        Destination::S3 { bucket, .. } if bucket.trim().is_empty() => {
            errors.push("bucket must not be empty".to_string());
        }
        Destination::Local { dir } if dir.as_os_str().is_empty() => {
            errors.push("dir must not be empty".to_string());
        }
        _ => {}
    }

    if let (Some(start), Some(end)) = (config.window.start, config.window.end) {
        if start > end {
            warn!(%start, %end, "Window start is after its end, nothing will be collected");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
