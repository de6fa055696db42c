//! User-facing notices
//!
//! Every failure surfaced by a tracker produces exactly one error notice.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// Success notice
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Error notice
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Check if this is an error notice
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "ok: {}", self.message),
            NoticeLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Receiver of user-facing notices
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show one notice
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(notice = %notice.message, "notice"),
            NoticeLevel::Error => tracing::warn!(notice = %notice.message, "notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_level() {
        assert!(Notice::error("boom").is_error());
        assert!(!Notice::success("fine").is_error());
    }

    #[test]
    fn display_prefixes_level() {
        assert_eq!(Notice::success("started").to_string(), "ok: started");
        assert_eq!(Notice::error("failed").to_string(), "error: failed");
    }

    #[test]
    fn mock_notifier_receives_one_call() {
        let mut mock = MockNotifier::new();
        mock.expect_notify()
            .withf(|n| n.is_error() && n.message == "Invalid location data")
            .times(1)
            .return_const(());

        mock.notify(Notice::error("Invalid location data"));
    }
}
