//! Acquisition handles
//!
//! A handle is issued by exactly one backend variant. Its shape differs by
//! variant, so it is carried as a tagged enum and teardown dispatches on
//! the tag instead of probing the value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which acquisition backend issued a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Browser-style watch, active while the page is in the foreground
    Foreground,
    /// Native watcher that keeps running with the app in the background
    Background,
}

impl BackendKind {
    /// Lowercase name used in logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Foreground => "foreground",
            BackendKind::Background => "background",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric watch id scoped to the foreground context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WatchId(pub u32);

/// String id of a native background watcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatcherId(pub String);

impl WatcherId {
    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque token for one acquisition run
///
/// Not `Copy`: a handle is moved into the session on start and moved out
/// again on release, so it cannot be released twice by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionHandle {
    Foreground(WatchId),
    Background(WatcherId),
}

impl SessionHandle {
    /// Backend that issued this handle
    #[inline]
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            SessionHandle::Foreground(_) => BackendKind::Foreground,
            SessionHandle::Background(_) => BackendKind::Background,
        }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionHandle::Foreground(id) => write!(f, "foreground#{}", id.0),
            SessionHandle::Background(id) => write!(f, "background:{}", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_kind_matches_variant() {
        assert_eq!(SessionHandle::Foreground(WatchId(1)).kind(), BackendKind::Foreground);
        assert_eq!(
            SessionHandle::Background(WatcherId("w".into())).kind(),
            BackendKind::Background
        );
    }

    #[test]
    fn handle_serializes_as_tagged_variant() {
        let json = serde_json::to_value(SessionHandle::Foreground(WatchId(7))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "foreground", "value": 7}));

        let json = serde_json::to_value(SessionHandle::Background(WatcherId("abc".into()))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "background", "value": "abc"}));
    }

    #[test]
    fn handle_display() {
        assert_eq!(SessionHandle::Foreground(WatchId(3)).to_string(), "foreground#3");
        assert_eq!(
            SessionHandle::Background(WatcherId("x1".into())).to_string(),
            "background:x1"
        );
    }
}
