//! TrackMaster Core
//!
//! Shared building blocks for the tracking crates:
//! - The position [`Reading`] record and the identifiers around it
//! - [`LocationValidator`], the bounds check every reading passes before storage
//! - The [`PersistenceSink`] contract and an in-memory implementation
//! - User-facing notices through [`Notifier`]
//! - Watch configuration loaded from TOML
//!
//! # Example
//!
//! ```rust
//! use trackmaster_core::{LocationValidator, Reading};
//!
//! let reading = Reading::new(45.0, -122.0, 5.0).with_altitude(100.0);
//! assert!(LocationValidator::is_valid(&reading));
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod notify;
pub mod sink;
pub mod store;
pub mod types;
pub mod validator;

pub use config::{BackgroundOptions, ForegroundOptions, TrackerConfig};
pub use error::{ConfigError, PersistError, ValidationError};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use sink::PersistenceSink;
pub use store::{MemoryStore, StoredActivity, StoredReading};
pub use types::{ActivityKind, Reading, UserId};
pub use validator::LocationValidator;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with TrackMaster core types
    pub use crate::{
        ActivityKind, LocationValidator, Notice, Notifier, PersistenceSink, Reading,
        TrackerConfig, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
