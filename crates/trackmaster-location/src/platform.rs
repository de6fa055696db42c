//! Platform geolocation primitives
//!
//! The two watch APIs the backends wrap, plus the capability probe used to
//! pick between them. Hosts (and tests) provide implementations.
//!
//! Readings flow from the platform to the session over an unbounded channel.
//! Each run gets a fresh channel, so a platform that keeps sending after its
//! watch was cleared only hits a closed receiver.

use crate::handle::{WatchId, WatcherId};
use tokio::sync::mpsc;
use trackmaster_core::{BackgroundOptions, ForegroundOptions, Reading};

/// One callback from a platform watch
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    /// New position fix
    Reading(Reading),
    /// Informational error, or terminal when `fatal`
    Error(AcquisitionFault),
}

/// Error reported by a platform watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionFault {
    pub message: String,
    pub fatal: bool,
}

impl AcquisitionFault {
    /// Error after which delivery continues
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    /// Error after which the platform delivers nothing more
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }
}

/// Sending half handed to a platform watch
pub type PositionSender = mpsc::UnboundedSender<PositionEvent>;

/// Receiving half owned by the session
pub type PositionReceiver = mpsc::UnboundedReceiver<PositionEvent>;

/// Failure reported by a platform primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// User declined the location prompt
    #[error("permission denied")]
    PermissionDenied,
    /// Location services are off or missing
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Anything else the platform reports
    #[error("{0}")]
    Other(String),
}

/// Browser-style `watchPosition` / `clearWatch`
pub trait ForegroundGeolocation: Send + Sync {
    /// Whether a geolocation object exists in this context
    fn is_supported(&self) -> bool;

    /// Begin watching; returns immediately with the watch id
    fn watch_position(&self, options: &ForegroundOptions, events: PositionSender) -> WatchId;

    /// Stop a watch; unknown ids are ignored
    fn clear_watch(&self, id: WatchId);
}

/// Native `addWatcher` / `removeWatcher`
#[async_trait::async_trait]
pub trait BackgroundGeolocation: Send + Sync {
    /// Register a watcher; may prompt for permission
    async fn add_watcher(
        &self,
        options: &BackgroundOptions,
        events: PositionSender,
    ) -> Result<WatcherId, PlatformError>;

    /// Remove a watcher by id
    fn remove_watcher(&self, id: &WatcherId) -> Result<(), PlatformError>;
}

/// Environment capability detection, consulted once per `begin()`
pub trait CapabilityProbe: Send + Sync {
    /// Running inside a native shell with background location
    fn native_background_available(&self) -> bool;

    /// A foreground geolocation API is present
    fn foreground_available(&self) -> bool;
}

/// Probe with fixed answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StaticProbe {
    pub native_background: bool,
    pub foreground: bool,
}

impl StaticProbe {
    /// Native shell with background location
    #[must_use]
    pub fn native() -> Self {
        Self {
            native_background: true,
            foreground: true,
        }
    }

    /// Plain browser context
    #[must_use]
    pub fn browser() -> Self {
        Self {
            native_background: false,
            foreground: true,
        }
    }

    /// No geolocation at all
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl CapabilityProbe for StaticProbe {
    fn native_background_available(&self) -> bool {
        self.native_background
    }

    fn foreground_available(&self) -> bool {
        self.foreground
    }
}
