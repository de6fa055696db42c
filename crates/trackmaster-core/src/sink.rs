//! Persistence sink contract
//!
//! The managed backend is external; trackers only write through this trait.

use crate::error::PersistError;
use crate::types::{ActivityKind, Reading, UserId};

/// Write side of the remote data store
#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store one validated reading for `user`
    async fn store_reading(&self, reading: &Reading, user: UserId) -> Result<(), PersistError>;

    /// Append an entry to the user's activity feed
    async fn log_activity(
        &self,
        user: UserId,
        kind: ActivityKind,
        title: &str,
        description: &str,
    ) -> Result<(), PersistError>;
}
