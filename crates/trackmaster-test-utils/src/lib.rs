//! Testing utilities for TrackMaster workspace
//!
//! Shared fakes and fixtures: recording platform primitives, a sink with
//! switchable failures and a notifier that keeps every notice.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use trackmaster_core::{
    ActivityKind, BackgroundOptions, ForegroundOptions, MemoryStore, Notice, Notifier,
    PersistError, PersistenceSink, Reading, TrackerConfig, UserId,
};
use trackmaster_location::{
    AcquisitionFault, BackendSet, BackgroundGeolocation, ForegroundGeolocation, PlatformError,
    PositionEvent, PositionSender, StaticProbe, TrackingSession, WatchId, WatcherId,
};

/// Reading accepted by the validator
pub fn valid_reading() -> Reading {
    Reading::new(45.0, -122.0, 5.0).with_altitude(100.0)
}

/// Reading with latitude 91
pub fn invalid_reading() -> Reading {
    Reading::new(91.0, -122.0, 5.0)
}

/// Foreground platform that records every call
#[derive(Debug)]
pub struct RecordingForeground {
    supported: bool,
    next: Mutex<u32>,
    watches: Mutex<HashMap<WatchId, PositionSender>>,
    cleared: Mutex<Vec<WatchId>>,
}

impl RecordingForeground {
    pub fn new() -> Self {
        Self::with_support(true)
    }

    pub fn with_support(supported: bool) -> Self {
        Self {
            supported,
            next: Mutex::new(0),
            watches: Mutex::new(HashMap::new()),
            cleared: Mutex::new(Vec::new()),
        }
    }

    /// Ids passed to `clear_watch`, in call order
    pub fn cleared(&self) -> Vec<WatchId> {
        self.cleared.lock().clone()
    }

    /// Ids handed out by `watch_position`
    pub fn started(&self) -> u32 {
        *self.next.lock()
    }

    /// Push a callback into a watch; `false` if the receiver is gone
    pub fn emit(&self, id: WatchId, event: PositionEvent) -> bool {
        self.watches
            .lock()
            .get(&id)
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    pub fn emit_reading(&self, id: WatchId, reading: Reading) -> bool {
        self.emit(id, PositionEvent::Reading(reading))
    }
}

impl Default for RecordingForeground {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundGeolocation for RecordingForeground {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn watch_position(&self, _options: &ForegroundOptions, events: PositionSender) -> WatchId {
        let mut next = self.next.lock();
        *next += 1;
        let id = WatchId(*next);
        self.watches.lock().insert(id, events);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.watches.lock().remove(&id);
        self.cleared.lock().push(id);
    }
}

/// How the background platform answers `add_watcher`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundMode {
    Grant,
    Deny,
    Fail(String),
}

/// Background platform that records every call
#[derive(Debug)]
pub struct RecordingBackground {
    mode: Mutex<BackgroundMode>,
    fail_remove: AtomicBool,
    next: Mutex<u32>,
    watchers: Mutex<HashMap<WatcherId, PositionSender>>,
    removed: Mutex<Vec<WatcherId>>,
}

impl RecordingBackground {
    pub fn new() -> Self {
        Self::with_mode(BackgroundMode::Grant)
    }

    pub fn with_mode(mode: BackgroundMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            fail_remove: AtomicBool::new(false),
            next: Mutex::new(0),
            watchers: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: BackgroundMode) {
        *self.mode.lock() = mode;
    }

    /// Make `remove_watcher` report an error (the call is still recorded)
    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// Ids passed to `remove_watcher`, in call order
    pub fn removed(&self) -> Vec<WatcherId> {
        self.removed.lock().clone()
    }

    pub fn emit(&self, id: &WatcherId, event: PositionEvent) -> bool {
        self.watchers
            .lock()
            .get(id)
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    pub fn emit_reading(&self, id: &WatcherId, reading: Reading) -> bool {
        self.emit(id, PositionEvent::Reading(reading))
    }

    pub fn emit_fault(&self, id: &WatcherId, fault: AcquisitionFault) -> bool {
        self.emit(id, PositionEvent::Error(fault))
    }
}

impl Default for RecordingBackground {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BackgroundGeolocation for RecordingBackground {
    async fn add_watcher(
        &self,
        _options: &BackgroundOptions,
        events: PositionSender,
    ) -> Result<WatcherId, PlatformError> {
        let mode = self.mode.lock().clone();
        match mode {
            BackgroundMode::Grant => {
                let mut next = self.next.lock();
                *next += 1;
                let id = WatcherId(format!("watcher-{}", *next));
                self.watchers.lock().insert(id.clone(), events);
                Ok(id)
            }
            BackgroundMode::Deny => Err(PlatformError::PermissionDenied),
            BackgroundMode::Fail(reason) => Err(PlatformError::Other(reason)),
        }
    }

    fn remove_watcher(&self, id: &WatcherId) -> Result<(), PlatformError> {
        self.removed.lock().push(id.clone());
        self.watchers.lock().remove(id);
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(PlatformError::Other("watcher not found".to_string()));
        }
        Ok(())
    }
}

/// Notifier that keeps every notice
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.is_error())
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// In-memory sink whose writes can be made to fail
#[derive(Debug, Default)]
pub struct FlakySink {
    inner: MemoryStore,
    fail_readings: AtomicBool,
    fail_activities: AtomicBool,
}

impl FlakySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_readings(&self, fail: bool) {
        self.fail_readings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activities(&self, fail: bool) {
        self.fail_activities.store(fail, Ordering::SeqCst);
    }

    pub fn store(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn stored_readings(&self) -> Vec<Reading> {
        self.inner.readings().into_iter().map(|r| r.reading).collect()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for FlakySink {
    async fn store_reading(&self, reading: &Reading, user: UserId) -> Result<(), PersistError> {
        if self.fail_readings.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("simulated outage".to_string()));
        }
        self.inner.store_reading(reading, user).await
    }

    async fn log_activity(
        &self,
        user: UserId,
        kind: ActivityKind,
        title: &str,
        description: &str,
    ) -> Result<(), PersistError> {
        if self.fail_activities.load(Ordering::SeqCst) {
            return Err(PersistError::Rejected {
                table: "activity_logs",
                reason: "simulated rejection".to_string(),
            });
        }
        self.inner.log_activity(user, kind, title, description).await
    }
}

/// A session wired to recording fakes
pub struct SessionFixture {
    pub user: UserId,
    pub foreground: Arc<RecordingForeground>,
    pub background: Arc<RecordingBackground>,
    pub sink: Arc<FlakySink>,
    pub notifier: Arc<RecordingNotifier>,
    pub session: TrackingSession,
}

impl SessionFixture {
    /// Session in a plain browser context
    pub fn browser() -> Self {
        Self::with_probe(StaticProbe::browser(), RecordingForeground::new(), RecordingBackground::new())
    }

    /// Session in a native shell
    pub fn native() -> Self {
        Self::with_probe(StaticProbe::native(), RecordingForeground::new(), RecordingBackground::new())
    }

    pub fn with_probe(
        probe: StaticProbe,
        foreground: RecordingForeground,
        background: RecordingBackground,
    ) -> Self {
        let user = UserId::new();
        let foreground = Arc::new(foreground);
        let background = Arc::new(background);
        let sink = Arc::new(FlakySink::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let backends = BackendSet::from_platform(
            Arc::new(probe),
            foreground.clone(),
            background.clone(),
            &TrackerConfig::default(),
        );
        let session = TrackingSession::new(user, backends, sink.clone(), notifier.clone());

        Self {
            user,
            foreground,
            background,
            sink,
            notifier,
            session,
        }
    }
}
