//! In-memory persistence sink
//!
//! Append-only tables of readings and activity entries, guarded by
//! `parking_lot` mutexes. Backs the simulator and the tests.

use crate::error::PersistError;
use crate::sink::PersistenceSink;
use crate::types::{ActivityKind, Reading, UserId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Row of the location table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub user: UserId,
    pub reading: Reading,
    pub tracked_at: DateTime<Utc>,
}

/// Row of the activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredActivity {
    pub user: UserId,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub logged_at: DateTime<Utc>,
}

/// Sink that keeps every write in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<StoredReading>>,
    activities: Mutex<Vec<StoredActivity>>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored readings in write order
    #[must_use]
    pub fn readings(&self) -> Vec<StoredReading> {
        self.readings.lock().clone()
    }

    /// All activity entries in write order
    #[must_use]
    pub fn activities(&self) -> Vec<StoredActivity> {
        self.activities.lock().clone()
    }

    /// Number of readings stored for `user`
    #[must_use]
    pub fn location_count(&self, user: UserId) -> usize {
        self.readings.lock().iter().filter(|r| r.user == user).count()
    }

    /// Activity entries of one kind for `user`
    #[must_use]
    pub fn activities_of(&self, user: UserId, kind: ActivityKind) -> Vec<StoredActivity> {
        self.activities
            .lock()
            .iter()
            .filter(|a| a.user == user && a.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for MemoryStore {
    async fn store_reading(&self, reading: &Reading, user: UserId) -> Result<(), PersistError> {
        self.readings.lock().push(StoredReading {
            user,
            reading: *reading,
            tracked_at: Utc::now(),
        });
        Ok(())
    }

    async fn log_activity(
        &self,
        user: UserId,
        kind: ActivityKind,
        title: &str,
        description: &str,
    ) -> Result<(), PersistError> {
        self.activities.lock().push(StoredActivity {
            user,
            kind,
            title: title.to_string(),
            description: description.to_string(),
            logged_at: Utc::now(),
        });
        Ok(())
    }
}
