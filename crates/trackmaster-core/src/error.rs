//! Error types for TrackMaster core
//!
//! - Reading bound violations
//! - Persistence sink failures
//! - Configuration loading failures

use std::path::PathBuf;

/// A reading bound that did not hold
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Latitude outside [-90, 90]
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Accuracy not strictly positive
    #[error("accuracy {0} must be greater than 0")]
    NonPositiveAccuracy(f64),

    /// Altitude magnitude at or above the limit
    #[error("altitude {0} exceeds 100000 m")]
    AltitudeOutOfRange(f64),
}

/// Sink write failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    /// Backend rejected the write
    #[error("write rejected by {table}: {reason}")]
    Rejected {
        /// Target table
        table: &'static str,
        /// Backend message
        reason: String,
    },

    /// Backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Row to update does not exist
    #[error("record not found: {0}")]
    NotFound(String),
}

impl PersistError {
    /// Check if a later write could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// A value is out of its allowed range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_name_the_value() {
        let err = ValidationError::LatitudeOutOfRange(91.0);
        assert_eq!(err.to_string(), "latitude 91 outside [-90, 90]");
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(PersistError::Unavailable("timeout".into()).is_retryable());
        assert!(!PersistError::Rejected {
            table: "location_tracks",
            reason: "constraint".into(),
        }
        .is_retryable());
        assert!(!PersistError::NotFound("x".into()).is_retryable());
    }
}
