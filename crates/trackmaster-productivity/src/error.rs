//! Error types for the productivity trackers

use crate::task::TaskId;
use trackmaster_core::PersistError;

/// Productivity tracker errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductivityError {
    /// Title empty or whitespace
    #[error("a title is required")]
    MissingTitle,

    /// A time session is already running
    #[error("a time session is already active")]
    SessionAlreadyActive,

    /// No time session is running
    #[error("no active time session")]
    NoActiveSession,

    /// Progress above 100
    #[error("progress {0} is outside 0..=100")]
    InvalidProgress(u8),

    /// Unknown task id
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Store write failed
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
}

impl ProductivityError {
    /// Check if the caller supplied bad input
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingTitle | Self::InvalidProgress(_))
    }
}
