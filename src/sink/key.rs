use crate::error::{CollectError, Result};
use crate::rds::{SlowLogFile, SLOW_LOG_PREFIX};
use chrono::NaiveDateTime;
use regex::Regex;

// Suffix layout the service appends to rotated slow-query logs, e.g. 2023-06-15.04
const NAME_TIME_FORMAT: &str = "%Y-%m-%d.%H";
// chrono accepts unpadded fields and a signed year, so the shape is checked first
const NAME_TIME_SHAPE: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\.[0-9]{2}$";
const KEY_TIME_FORMAT: &str = "%Y/%m/%d/%H";

/// Turn a log file name into an hourly `YYYY/MM/DD/HH` path segment.
pub fn derive_time_key(file: &SlowLogFile) -> Result<String> {
    let parse_error = |reason: String| CollectError::Parse {
        name: file.name.clone(),
        reason,
    };

    let suffix = file
        .name
        .strip_prefix(SLOW_LOG_PREFIX)
        .ok_or_else(|| parse_error(format!("missing prefix '{SLOW_LOG_PREFIX}'")))?;

    let shape = Regex::new(NAME_TIME_SHAPE).map_err(|e| parse_error(e.to_string()))?;
    if !shape.is_match(suffix) {
        return Err(parse_error(format!("'{suffix}' is not YYYY-MM-DD.HH")));
    }

    // NaiveDateTime needs a minute, so pin it to the top of the hour.
    let parsed = NaiveDateTime::parse_from_str(
        &format!("{suffix}:00"),
        &format!("{NAME_TIME_FORMAT}:%M"),
    )
    .map_err(|e| parse_error(format!("'{suffix}' is not {NAME_TIME_FORMAT}: {e}")))?;

    Ok(parsed.format(KEY_TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SlowLogFile {
        SlowLogFile {
            instance_id: "db-1".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_hourly_key() {
        let key = derive_time_key(&file("slowquery/mysql-slowquery.log.2023-06-15.04")).unwrap();
        assert_eq!(key, "2023/06/15/04");
    }

    #[test]
    fn test_afternoon_hour_is_kept_literally() {
        let key = derive_time_key(&file("slowquery/mysql-slowquery.log.2023-06-15.13")).unwrap();
        assert_eq!(key, "2023/06/15/13");
    }

    #[test]
    fn test_unpadded_name_does_not_alias_padded_key() {
        let padded = derive_time_key(&file("slowquery/mysql-slowquery.log.2023-06-15.04"));
        let unpadded = derive_time_key(&file("slowquery/mysql-slowquery.log.2023-6-15.4"));

        assert_eq!(padded.unwrap(), "2023/06/15/04");
        assert!(matches!(unpadded, Err(CollectError::Parse { .. })));
    }

    #[test]
    fn test_missing_prefix() {
        let err = derive_time_key(&file("error/mysql-error.log.2023-06-15.04")).unwrap_err();
        assert!(matches!(err, CollectError::Parse { .. }));
    }

    #[test]
    fn test_unparseable_suffix() {
        for name in [
            "slowquery/mysql-slowquery.log",
            "slowquery/mysql-slowquery.log.",
            "slowquery/mysql-slowquery.log.2023-06-15",
            "slowquery/mysql-slowquery.log.2023-06-15.4x",
            "slowquery/mysql-slowquery.log.2023-13-15.04",
            "slowquery/mysql-slowquery.log.2023-06-15.04.gz",
            "slowquery/mysql-slowquery.log.2023-6-15.4",
            "slowquery/mysql-slowquery.log.2023-06-5.04",
            "slowquery/mysql-slowquery.log.+2023-06-15.04",
            "slowquery/mysql-slowquery.log.2023-06-15.24",
        ] {
            let err = derive_time_key(&file(name)).unwrap_err();
            assert!(matches!(err, CollectError::Parse { .. }), "{name} should not parse");
        }
    }
}
