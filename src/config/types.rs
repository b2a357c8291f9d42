use crate::rds::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Layout of the YAML config file. Every section is optional so that flags
/// and environment variables can fill the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub clusters: Vec<String>,
    #[serde(default)]
    pub window: WindowConfig,
    pub sink: Option<SinkConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default, with = "utc_time")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, with = "utc_time")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    S3 {
        bucket: String,
        #[serde(default = "default_key_prefix")]
        prefix: String,
    },
    Local {
        dir: PathBuf,
    },
}

pub fn default_key_prefix() -> String {
    "slowquery".to_string()
}

/// Values given on the command line; they take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub dir: Option<PathBuf>,
    pub clusters: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Where collected logs end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    S3 { bucket: String, prefix: String },
    Local { dir: PathBuf },
}

/// Fully resolved settings for one collection run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub region: String,
    pub clusters: Vec<String>,
    pub window: TimeWindow,
    pub destination: Destination,
}

/// `YYYY-MM-DDTHH:MM:SS`, read as UTC.
pub const WINDOW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) mod utc_time {
    use super::WINDOW_TIME_FORMAT;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(WINDOW_TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse(value).map(Some).map_err(serde::de::Error::custom),
        }
    }

    pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
        NaiveDateTime::parse_from_str(value, WINDOW_TIME_FORMAT)
            .map(|ndt| Utc.from_utc_datetime(&ndt))
            .map_err(|e| format!("'{}' is not {}: {}", value, WINDOW_TIME_FORMAT, e))
    }
}
