use thiserror::Error;

/// Errors raised while enumerating, fetching or storing slow-query logs.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to parse log file name '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CollectError {
    pub fn service(operation: &'static str, err: impl std::fmt::Display) -> Self {
        CollectError::Service {
            operation,
            message: err.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CollectError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectError>;
