//! Time-session tracking
//!
//! At most one running session per tracker. A session is stored when it
//! starts and updated with its end time and duration when it stops; the
//! tracker only changes state after the store accepted the write.

use crate::clock::{Clock, SystemClock};
use crate::error::ProductivityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use trackmaster_core::{ActivityKind, Notice, Notifier, PersistError, PersistenceSink, UserId};
use uuid::Uuid;

/// Time session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSessionId(pub Uuid);

impl TimeSessionId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimeSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimeSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored work session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSession {
    pub id: TimeSessionId,
    pub user: UserId,
    pub title: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub is_active: bool,
}

/// Storage for time sessions
#[async_trait::async_trait]
pub trait TimeSessionStore: Send + Sync {
    async fn insert_session(&self, session: &TimeSession) -> Result<(), PersistError>;

    /// Mark a session finished
    async fn finish_session(
        &self,
        id: TimeSessionId,
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    ) -> Result<(), PersistError>;

    async fn sessions(&self, user: UserId) -> Result<Vec<TimeSession>, PersistError>;
}

/// `HH:MM:SS`; hours keep counting past 24
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Tracks one running work session
pub struct TimeTracker {
    user: UserId,
    store: Arc<dyn TimeSessionStore>,
    sink: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    active: Option<TimeSession>,
}

impl TimeTracker {
    #[must_use]
    pub fn new(
        user: UserId,
        store: Arc<dyn TimeSessionStore>,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_clock(user, store, sink, notifier, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        user: UserId,
        store: Arc<dyn TimeSessionStore>,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user,
            store,
            sink,
            notifier,
            clock,
            active: None,
        }
    }

    /// The running session, if any
    #[must_use]
    pub fn active(&self) -> Option<&TimeSession> {
        self.active.as_ref()
    }

    /// Whole seconds since the running session started; 0 when idle
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.active.as_ref().map_or(0, |s| {
            u64::try_from((self.clock.now() - s.started_at).num_seconds()).unwrap_or(0)
        })
    }

    /// Start a session
    ///
    /// # Errors
    /// - `MissingTitle` for a blank title
    /// - `SessionAlreadyActive` if one is running
    /// - `Persist` if the store rejects the session; the tracker stays idle
    pub async fn start(
        &mut self,
        title: &str,
        description: &str,
    ) -> Result<TimeSessionId, ProductivityError> {
        let title = title.trim();
        if title.is_empty() {
            self.notifier.notify(Notice::error("Please enter a title"));
            return Err(ProductivityError::MissingTitle);
        }
        if self.active.is_some() {
            return Err(ProductivityError::SessionAlreadyActive);
        }

        let session = TimeSession {
            id: TimeSessionId::new(),
            user: self.user,
            title: title.to_string(),
            description: description.to_string(),
            started_at: self.clock.now(),
            ended_at: None,
            duration_seconds: None,
            is_active: true,
        };

        if let Err(e) = self.store.insert_session(&session).await {
            tracing::error!(user = %self.user, error = %e, "failed to start time session");
            self.notifier.notify(Notice::error("Failed to start session"));
            return Err(e.into());
        }

        let id = session.id;
        tracing::info!(user = %self.user, session = %id, title, "time session started");
        self.active = Some(session);
        self.notifier.notify(Notice::success("Time tracking started"));
        self.log(
            "Time Session Started",
            &format!("Started tracking \"{title}\""),
        )
        .await;
        Ok(id)
    }

    /// Stop the running session and return it as stored
    ///
    /// # Errors
    /// - `NoActiveSession` when idle
    /// - `Persist` if the store rejects the update; the session keeps running
    pub async fn stop(&mut self) -> Result<TimeSession, ProductivityError> {
        let Some(active) = &self.active else {
            return Err(ProductivityError::NoActiveSession);
        };
        let id = active.id;
        let ended_at = self.clock.now();
        let duration = self.elapsed();

        if let Err(e) = self.store.finish_session(id, ended_at, duration).await {
            tracing::error!(user = %self.user, session = %id, error = %e, "failed to stop time session");
            self.notifier.notify(Notice::error("Failed to stop session"));
            return Err(e.into());
        }

        let Some(mut session) = self.active.take() else {
            return Err(ProductivityError::NoActiveSession);
        };
        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration);
        session.is_active = false;

        let formatted = format_duration(duration);
        tracing::info!(user = %self.user, session = %id, duration, "time session ended");
        self.notifier
            .notify(Notice::success(format!("Session ended: {formatted}")));
        self.log(
            "Time Session Ended",
            &format!("Completed \"{}\" - Duration: {formatted}", session.title),
        )
        .await;
        Ok(session)
    }

    async fn log(&self, title: &str, description: &str) {
        if let Err(e) = self
            .sink
            .log_activity(self.user, ActivityKind::Time, title, description)
            .await
        {
            tracing::warn!(user = %self.user, error = %e, "failed to log time activity");
            self.notifier.notify(Notice::error("Failed to log activity"));
        }
    }
}

impl fmt::Debug for TimeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeTracker")
            .field("user", &self.user)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_pads_fields() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(3661), "01:01:01");
    }

    #[test]
    fn format_duration_does_not_wrap_days() {
        assert_eq!(format_duration(100 * 3600 + 5), "100:00:05");
    }
}
