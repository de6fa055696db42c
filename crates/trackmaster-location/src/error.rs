//! Error types for location tracking
//!
//! Only the start failures abort `begin()`; everything else is scoped to one
//! reading or one release and never changes session state.

use crate::handle::{BackendKind, SessionHandle};
use trackmaster_core::{PersistError, ValidationError};

/// Errors surfaced by backends and the tracking session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    /// No usable geolocation capability
    #[error("location acquisition unavailable: {0}")]
    AcquisitionUnavailable(String),

    /// User or platform refused location access
    #[error("location permission denied")]
    PermissionDenied,

    /// `begin()` while a run is active
    #[error("already tracking with {0}")]
    AlreadyTracking(SessionHandle),

    /// A reading arrived with no active run
    #[error("not tracking")]
    NotTracking,

    /// Reading out of bounds; it was discarded
    #[error("reading rejected: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Sink write failed; the session keeps running
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),

    /// Backend reported an error while delivering readings
    #[error("{backend} acquisition error: {message}")]
    Acquisition {
        /// Reporting backend
        backend: BackendKind,
        /// Platform message
        message: String,
        /// Delivery stopped for this run
        fatal: bool,
    },

    /// Native watch could not be released cleanly
    #[error("failed to release {handle}: {reason}")]
    Release {
        /// Handle being released
        handle: SessionHandle,
        /// Platform message
        reason: String,
    },
}

impl TrackingError {
    /// Check if this error kept `begin()` from starting a run
    #[inline]
    #[must_use]
    pub fn is_start_failure(&self) -> bool {
        matches!(
            self,
            Self::AcquisitionUnavailable(_) | Self::PermissionDenied | Self::AlreadyTracking(_)
        )
    }

    /// Check if the error concerns a single reading
    #[inline]
    #[must_use]
    pub fn is_per_reading(&self) -> bool {
        matches!(self, Self::ValidationFailed(_) | Self::Persist(_))
    }
}
