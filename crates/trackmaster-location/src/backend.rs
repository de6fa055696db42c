//! Acquisition backends
//!
//! [`AcquisitionBackend`] hides the two platform watch APIs behind one
//! start/stop contract. Each variant tracks the handles it issued, which
//! makes `stop` idempotent: only the first stop of a live handle reaches the
//! platform, anything else is a logged no-op.

use crate::error::TrackingError;
use crate::handle::{BackendKind, SessionHandle, WatchId, WatcherId};
use crate::platform::{
    BackgroundGeolocation, CapabilityProbe, ForegroundGeolocation, PlatformError, PositionSender,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use trackmaster_core::{BackgroundOptions, ForegroundOptions, TrackerConfig};

/// One way of acquiring positions
#[async_trait::async_trait]
pub trait AcquisitionBackend: Send + Sync {
    /// Variant tag, matching the handles this backend issues
    fn kind(&self) -> BackendKind;

    /// Start continuous acquisition, delivering into `events`
    ///
    /// Returns as soon as the platform has accepted the watch.
    ///
    /// # Errors
    /// - `TrackingError::AcquisitionUnavailable` if the capability is absent
    /// - `TrackingError::PermissionDenied` if the user declines
    async fn start(&self, events: PositionSender) -> Result<SessionHandle, TrackingError>;

    /// Release a handle
    ///
    /// Stale, already released or foreign handles are ignored.
    ///
    /// # Errors
    /// `TrackingError::Release` if the platform fails to remove a live watch.
    /// The handle counts as released either way.
    fn stop(&self, handle: &SessionHandle) -> Result<(), TrackingError>;
}

/// Backend over the foreground watch API
pub struct ForegroundBackend {
    platform: Arc<dyn ForegroundGeolocation>,
    options: ForegroundOptions,
    live: Mutex<HashSet<WatchId>>,
}

impl ForegroundBackend {
    /// Wrap a foreground platform
    #[must_use]
    pub fn new(platform: Arc<dyn ForegroundGeolocation>, options: ForegroundOptions) -> Self {
        Self {
            platform,
            options,
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Number of watches started and not yet stopped
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl std::fmt::Debug for ForegroundBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForegroundBackend")
            .field("options", &self.options)
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AcquisitionBackend for ForegroundBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Foreground
    }

    async fn start(&self, events: PositionSender) -> Result<SessionHandle, TrackingError> {
        if !self.platform.is_supported() {
            return Err(TrackingError::AcquisitionUnavailable(
                "geolocation is not supported in this context".to_string(),
            ));
        }

        let id = self.platform.watch_position(&self.options, events);
        self.live.lock().insert(id);
        tracing::debug!(watch = id.0, "foreground watch started");
        Ok(SessionHandle::Foreground(id))
    }

    fn stop(&self, handle: &SessionHandle) -> Result<(), TrackingError> {
        let SessionHandle::Foreground(id) = handle else {
            tracing::warn!(%handle, "foreground backend asked to stop a foreign handle");
            return Ok(());
        };

        if self.live.lock().remove(id) {
            self.platform.clear_watch(*id);
            tracing::debug!(watch = id.0, "foreground watch cleared");
        } else {
            tracing::debug!(watch = id.0, "foreground watch already cleared");
        }
        Ok(())
    }
}

/// Backend over the native background watcher
pub struct BackgroundBackend {
    platform: Arc<dyn BackgroundGeolocation>,
    options: BackgroundOptions,
    live: Mutex<HashSet<WatcherId>>,
}

impl BackgroundBackend {
    /// Wrap a background platform
    #[must_use]
    pub fn new(platform: Arc<dyn BackgroundGeolocation>, options: BackgroundOptions) -> Self {
        Self {
            platform,
            options,
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Number of watchers added and not yet removed
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl std::fmt::Debug for BackgroundBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundBackend")
            .field("options", &self.options)
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AcquisitionBackend for BackgroundBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Background
    }

    async fn start(&self, events: PositionSender) -> Result<SessionHandle, TrackingError> {
        let id = self
            .platform
            .add_watcher(&self.options, events)
            .await
            .map_err(|e| match e {
                PlatformError::PermissionDenied => TrackingError::PermissionDenied,
                PlatformError::Unavailable(reason) | PlatformError::Other(reason) => {
                    TrackingError::AcquisitionUnavailable(reason)
                }
            })?;

        self.live.lock().insert(id.clone());
        tracing::debug!(watcher = %id.as_str(), "background watcher added");
        Ok(SessionHandle::Background(id))
    }

    fn stop(&self, handle: &SessionHandle) -> Result<(), TrackingError> {
        let SessionHandle::Background(id) = handle else {
            tracing::warn!(%handle, "background backend asked to stop a foreign handle");
            return Ok(());
        };

        if !self.live.lock().remove(id) {
            tracing::debug!(watcher = %id.as_str(), "background watcher already removed");
            return Ok(());
        }

        self.platform
            .remove_watcher(id)
            .map_err(|e| TrackingError::Release {
                handle: handle.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(watcher = %id.as_str(), "background watcher removed");
        Ok(())
    }
}

/// Both backend variants plus the probe that picks between them
#[derive(Clone)]
pub struct BackendSet {
    probe: Arc<dyn CapabilityProbe>,
    foreground: Arc<dyn AcquisitionBackend>,
    background: Arc<dyn AcquisitionBackend>,
}

impl BackendSet {
    /// Assemble from already-built backends
    #[must_use]
    pub fn new(
        probe: Arc<dyn CapabilityProbe>,
        foreground: Arc<dyn AcquisitionBackend>,
        background: Arc<dyn AcquisitionBackend>,
    ) -> Self {
        Self {
            probe,
            foreground,
            background,
        }
    }

    /// Build both variants from platform primitives and config
    #[must_use]
    pub fn from_platform(
        probe: Arc<dyn CapabilityProbe>,
        foreground: Arc<dyn ForegroundGeolocation>,
        background: Arc<dyn BackgroundGeolocation>,
        config: &TrackerConfig,
    ) -> Self {
        Self::new(
            probe,
            Arc::new(ForegroundBackend::new(foreground, config.foreground.clone())),
            Arc::new(BackgroundBackend::new(background, config.background.clone())),
        )
    }

    /// Pick the variant for a new run
    ///
    /// Native background acquisition wins when present; otherwise the
    /// foreground API is used.
    ///
    /// # Errors
    /// `TrackingError::AcquisitionUnavailable` if neither probe succeeds.
    pub fn select(&self) -> Result<Arc<dyn AcquisitionBackend>, TrackingError> {
        if self.probe.native_background_available() {
            Ok(Arc::clone(&self.background))
        } else if self.probe.foreground_available() {
            Ok(Arc::clone(&self.foreground))
        } else {
            Err(TrackingError::AcquisitionUnavailable(
                "no geolocation capability detected".to_string(),
            ))
        }
    }

    /// Backend that owns handles of `kind`
    #[must_use]
    pub fn get(&self, kind: BackendKind) -> &Arc<dyn AcquisitionBackend> {
        match kind {
            BackendKind::Foreground => &self.foreground,
            BackendKind::Background => &self.background,
        }
    }

    /// Release `handle` through the backend that issued it
    ///
    /// # Errors
    /// As [`AcquisitionBackend::stop`].
    pub fn release(&self, handle: &SessionHandle) -> Result<(), TrackingError> {
        self.get(handle.kind()).stop(handle)
    }
}

impl std::fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSet")
            .field("native_background", &self.probe.native_background_available())
            .field("foreground", &self.probe.foreground_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StaticProbe;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingForeground {
        next: AtomicU32,
        cleared: Mutex<Vec<WatchId>>,
    }

    impl ForegroundGeolocation for CountingForeground {
        fn is_supported(&self) -> bool {
            true
        }

        fn watch_position(&self, _options: &ForegroundOptions, _events: PositionSender) -> WatchId {
            WatchId(self.next.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn clear_watch(&self, id: WatchId) {
            self.cleared.lock().push(id);
        }
    }

    struct DenyingBackground;

    #[async_trait::async_trait]
    impl BackgroundGeolocation for DenyingBackground {
        async fn add_watcher(
            &self,
            _options: &BackgroundOptions,
            _events: PositionSender,
        ) -> Result<WatcherId, PlatformError> {
            Err(PlatformError::PermissionDenied)
        }

        fn remove_watcher(&self, _id: &WatcherId) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn sender() -> PositionSender {
        tokio::sync::mpsc::unbounded_channel().0
    }

    #[tokio::test]
    async fn foreground_stop_is_idempotent() {
        let platform = Arc::new(CountingForeground::default());
        let backend = ForegroundBackend::new(platform.clone(), ForegroundOptions::default());

        let handle = backend.start(sender()).await.unwrap();
        assert_eq!(backend.live_count(), 1);

        backend.stop(&handle).unwrap();
        backend.stop(&handle).unwrap();

        assert_eq!(platform.cleared.lock().as_slice(), &[WatchId(1)]);
        assert_eq!(backend.live_count(), 0);
    }

    #[tokio::test]
    async fn foreground_ignores_foreign_and_stale_handles() {
        let platform = Arc::new(CountingForeground::default());
        let backend = ForegroundBackend::new(platform.clone(), ForegroundOptions::default());

        backend
            .stop(&SessionHandle::Background(WatcherId("w-1".into())))
            .unwrap();
        backend.stop(&SessionHandle::Foreground(WatchId(99))).unwrap();

        assert!(platform.cleared.lock().is_empty());
    }

    #[tokio::test]
    async fn background_maps_permission_denied() {
        let backend = BackgroundBackend::new(Arc::new(DenyingBackground), BackgroundOptions::default());
        let err = backend.start(sender()).await.unwrap_err();
        assert_eq!(err, TrackingError::PermissionDenied);
        assert_eq!(backend.live_count(), 0);
    }

    fn set(probe: StaticProbe) -> BackendSet {
        BackendSet::from_platform(
            Arc::new(probe),
            Arc::new(CountingForeground::default()),
            Arc::new(DenyingBackground),
            &TrackerConfig::default(),
        )
    }

    #[test]
    fn select_prefers_native_background() {
        let backend = set(StaticProbe::native()).select().unwrap();
        assert_eq!(backend.kind(), BackendKind::Background);
    }

    #[test]
    fn select_falls_back_to_foreground() {
        let backend = set(StaticProbe::browser()).select().unwrap();
        assert_eq!(backend.kind(), BackendKind::Foreground);
    }

    #[test]
    fn select_fails_without_capability() {
        let err = set(StaticProbe::unavailable()).select().err().unwrap();
        assert!(matches!(err, TrackingError::AcquisitionUnavailable(_)));
    }

    #[test]
    fn get_returns_backend_of_kind() {
        let backends = set(StaticProbe::browser());
        assert_eq!(backends.get(BackendKind::Background).kind(), BackendKind::Background);
        assert_eq!(backends.get(BackendKind::Foreground).kind(), BackendKind::Foreground);
    }
}
