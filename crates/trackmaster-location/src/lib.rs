//! TrackMaster Location
//!
//! Location tracking over two acquisition backends:
//! 1. **Foreground**: a browser-style watch with numeric ids
//! 2. **Background**: a native watcher with string ids that keeps running
//!    while the app is not in the foreground
//!
//! [`TrackingSession`] picks a backend per run, validates every reading
//! before it reaches the [`PersistenceSink`](trackmaster_core::PersistenceSink),
//! and releases the run's handle exactly once on `end()` or drop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trackmaster_location::prelude::*;
//!
//! let backends = BackendSet::from_platform(probe, foreground, background, &config);
//! let mut session = TrackingSession::new(user, backends, sink, notifier);
//!
//! session.begin().await?;
//! while let Some(result) = session.next_event().await {
//!     if let Err(e) = result {
//!         tracing::debug!(error = %e, "reading not stored");
//!     }
//! }
//! session.end()?;
//! ```

pub mod backend;
pub mod error;
pub mod handle;
pub mod platform;
pub mod session;

// Simulation harness
pub mod test_harness;

pub use backend::{AcquisitionBackend, BackendSet, BackgroundBackend, ForegroundBackend};
pub use error::TrackingError;
pub use handle::{BackendKind, SessionHandle, WatchId, WatcherId};
pub use platform::{
    AcquisitionFault, BackgroundGeolocation, CapabilityProbe, ForegroundGeolocation,
    PlatformError, PositionEvent, PositionSender, StaticProbe,
};
pub use session::{SessionStats, TrackingSession, TrackingState};

/// Common imports
pub mod prelude {
    pub use crate::backend::{AcquisitionBackend, BackendSet};
    pub use crate::error::TrackingError;
    pub use crate::handle::{BackendKind, SessionHandle};
    pub use crate::platform::{
        BackgroundGeolocation, CapabilityProbe, ForegroundGeolocation, PositionEvent, StaticProbe,
    };
    pub use crate::session::{TrackingSession, TrackingState};
}
