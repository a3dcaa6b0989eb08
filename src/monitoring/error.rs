//! Monitoring error types.

use thiserror::Error;

/// Errors that can occur during monitoring operations.
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to record event: {message}")]
    RecordError { message: String },

    #[error("Failed to generate snapshot: {message}")]
    SnapshotError { message: String },

    #[error("Failed to reset monitor: {message}")]
    ResetError { message: String },
}

impl MonitoringError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn record(message: impl Into<String>) -> Self {
        Self::RecordError {
            message: message.into(),
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::SnapshotError {
            message: message.into(),
        }
    }

    pub fn reset(message: impl Into<String>) -> Self {
        Self::ResetError {
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::RecordError { .. })
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::SnapshotError { .. })
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::ResetError { .. })
    }
}
