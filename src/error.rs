//! Error types shared across the application.
//!
//! None of these are fatal to the process: backend errors surface as
//! notifications, timeline errors as configuration warnings.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to a schedule backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned HTTP {status}")]
    Http { status: u16 },

    #[error("Server error: {message}")]
    Rpc { message: String },

    #[error("Authentication failed for '{login}' on database '{database}'")]
    Authentication { login: String, database: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Schedule {0} not found")]
    NotFound(i64),
}

impl BackendError {
    /// Returns true for failures that a manual refresh may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network(_) | BackendError::Http { .. })
    }
}

/// Invalid timeline configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("Date range ends ({to}) before it starts ({from})")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    #[error("Chart width must be a positive number of pixels, got {0}")]
    InvalidWidth(f32),
}

/// Errors while loading or saving the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from CSV export and snapshot files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BackendError::Http { status: 502 }, true)]
    #[case(BackendError::Rpc { message: "Access denied".into() }, false)]
    #[case(BackendError::Decode("not a list".into()), false)]
    #[case(BackendError::NotFound(7), false)]
    fn only_transport_failures_are_transient(#[case] error: BackendError, #[case] transient: bool) {
        assert_eq!(error.is_transient(), transient);
    }

    #[test]
    fn write_failures_are_not_reported_as_parse_errors() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let error = ConfigError::Serialize {
            path: PathBuf::from("settings.json"),
            source,
        };
        assert!(error.to_string().starts_with("Failed to serialize settings"));
    }
}
