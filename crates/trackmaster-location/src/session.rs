//! Tracking session state machine
//!
//! `Idle` ⇄ `Tracking(handle)`. The session exclusively owns the handle of
//! the active run: `begin` moves it in, `end` (or drop) moves it out and
//! releases it through the backend that issued it.
//!
//! Every entry point takes `&mut self`, so begin, end and reading dispatch
//! are serialized by construction. Readings are pulled from the run's
//! channel with [`TrackingSession::next_event`] or
//! [`TrackingSession::process_pending`].

use crate::backend::BackendSet;
use crate::error::TrackingError;
use crate::handle::{BackendKind, SessionHandle};
use crate::platform::{AcquisitionFault, PositionEvent, PositionReceiver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use trackmaster_core::{
    ActivityKind, LocationValidator, Notice, Notifier, PersistenceSink, Reading, UserId,
};

/// Observable session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking {
        handle: SessionHandle,
        backend: BackendKind,
    },
}

impl TrackingState {
    /// Check if a run is active
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking { .. })
    }
}

/// Per-session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Runs started
    pub runs: u64,
    /// Readings that passed validation
    pub accepted: u64,
    /// Readings discarded by validation
    pub rejected: u64,
    /// Readings stored by the sink
    pub persisted: u64,
    /// Sink write failures
    pub persist_failures: u64,
    /// Errors reported by the platform
    pub faults: u64,
}

/// The active run
#[derive(Debug)]
struct ActiveRun {
    handle: SessionHandle,
    /// `None` once the platform stopped delivering
    events: Option<PositionReceiver>,
}

/// One user's location tracking session
pub struct TrackingSession {
    user: UserId,
    backends: BackendSet,
    sink: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn Notifier>,
    run: Option<ActiveRun>,
    latest: watch::Sender<Option<Reading>>,
    stats: SessionStats,
}

impl TrackingSession {
    /// Create an idle session
    #[must_use]
    pub fn new(
        user: UserId,
        backends: BackendSet,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            user,
            backends,
            sink,
            notifier,
            run: None,
            latest,
            stats: SessionStats::default(),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> TrackingState {
        match &self.run {
            None => TrackingState::Idle,
            Some(run) => TrackingState::Tracking {
                handle: run.handle.clone(),
                backend: run.handle.kind(),
            },
        }
    }

    /// Check if a run is active
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.run.is_some()
    }

    /// Owner of stored readings
    #[inline]
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Last accepted reading, kept after the run ends
    #[must_use]
    pub fn latest_reading(&self) -> Option<Reading> {
        *self.latest.borrow()
    }

    /// Watch the latest-reading slot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Reading>> {
        self.latest.subscribe()
    }

    /// Counters since creation
    #[inline]
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Start a run on the backend the environment supports
    ///
    /// # Errors
    /// - `TrackingError::AlreadyTracking` if a run is active; the active run
    ///   is left untouched
    /// - `TrackingError::AcquisitionUnavailable` / `PermissionDenied` if no
    ///   run could be started; the session stays idle
    pub async fn begin(&mut self) -> Result<BackendKind, TrackingError> {
        if let Some(run) = &self.run {
            tracing::warn!(user = %self.user, handle = %run.handle, "begin while tracking");
            return Err(TrackingError::AlreadyTracking(run.handle.clone()));
        }

        let backend = match self.backends.select() {
            Ok(backend) => backend,
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Geolocation is not supported by your browser"));
                tracing::warn!(user = %self.user, error = %e, "no acquisition backend");
                return Err(e);
            }
        };
        let kind = backend.kind();

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = match backend.start(tx).await {
            Ok(handle) => handle,
            Err(e) => {
                self.notifier.notify(Notice::error(start_failure_message(kind, &e)));
                tracing::warn!(user = %self.user, backend = %kind, error = %e, "start failed");
                return Err(e);
            }
        };

        tracing::info!(user = %self.user, backend = %kind, %handle, "tracking started");
        self.run = Some(ActiveRun {
            handle,
            events: Some(rx),
        });
        self.stats.runs += 1;
        self.notifier.notify(Notice::success(match kind {
            BackendKind::Foreground => "Location tracking started",
            BackendKind::Background => "Background location tracking started",
        }));
        Ok(kind)
    }

    /// End the active run
    ///
    /// No-op when idle. The session is idle afterwards even if the platform
    /// fails to release the watch.
    ///
    /// # Errors
    /// `TrackingError::Release` when the backend reports a release failure.
    pub fn end(&mut self) -> Result<(), TrackingError> {
        let Some(kind) = self.release("end")? else {
            return Ok(());
        };
        self.notifier.notify(Notice::success(match kind {
            BackendKind::Foreground => "Location tracking stopped",
            BackendKind::Background => "Background tracking stopped",
        }));
        Ok(())
    }

    /// Take the run out of the session, then release its handle
    fn release(&mut self, reason: &'static str) -> Result<Option<BackendKind>, TrackingError> {
        let Some(run) = self.run.take() else {
            return Ok(None);
        };
        let ActiveRun { handle, events } = run;
        drop(events);

        let kind = handle.kind();
        match self.backends.release(&handle) {
            Ok(()) => {
                tracing::info!(user = %self.user, backend = %kind, %handle, reason, "tracking stopped");
                Ok(Some(kind))
            }
            Err(e) => {
                tracing::error!(user = %self.user, %handle, error = %e, reason, "release failed");
                self.notifier.notify(Notice::error("Failed to stop location tracking"));
                Err(e)
            }
        }
    }

    /// Wait for the next platform callback and dispatch it
    ///
    /// Returns `None` when idle or once the run's stream has closed.
    pub async fn next_event(&mut self) -> Option<Result<(), TrackingError>> {
        let event = {
            let events = self.run.as_mut()?.events.as_mut()?;
            events.recv().await
        };
        match event {
            Some(event) => Some(self.dispatch(event).await),
            None => {
                self.close_stream("platform closed the stream");
                None
            }
        }
    }

    /// Dispatch every callback already queued, without waiting
    pub async fn process_pending(&mut self) -> Vec<Result<(), TrackingError>> {
        let mut results = Vec::new();
        loop {
            let event = {
                let Some(events) = self.run.as_mut().and_then(|r| r.events.as_mut()) else {
                    break;
                };
                match events.try_recv() {
                    Ok(event) => event,
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.close_stream("platform closed the stream");
                        break;
                    }
                }
            };
            results.push(self.dispatch(event).await);
        }
        results
    }

    async fn dispatch(&mut self, event: PositionEvent) -> Result<(), TrackingError> {
        match event {
            PositionEvent::Reading(reading) => self.handle_reading(reading).await,
            PositionEvent::Error(fault) => Err(self.handle_fault(fault)),
        }
    }

    /// Validate one reading and forward it
    ///
    /// Valid readings overwrite the latest-reading slot, then go to the sink
    /// followed by an activity entry. Failures are reported once and leave
    /// the session state unchanged.
    ///
    /// # Errors
    /// - `TrackingError::NotTracking` if no run is active
    /// - `TrackingError::ValidationFailed` if the reading is out of bounds
    /// - `TrackingError::Persist` if a sink write fails
    pub async fn handle_reading(&mut self, reading: Reading) -> Result<(), TrackingError> {
        if self.run.is_none() {
            tracing::debug!(user = %self.user, "reading outside a run dropped");
            return Err(TrackingError::NotTracking);
        }

        if let Err(e) = LocationValidator::check(&reading) {
            self.stats.rejected += 1;
            tracing::warn!(user = %self.user, error = %e, "reading rejected");
            self.notifier.notify(Notice::error("Invalid location data"));
            return Err(e.into());
        }

        self.stats.accepted += 1;
        self.latest.send_replace(Some(reading));
        tracing::debug!(user = %self.user, %reading, accuracy = reading.accuracy, "reading accepted");

        if let Err(e) = self.sink.store_reading(&reading, self.user).await {
            self.stats.persist_failures += 1;
            tracing::error!(user = %self.user, error = %e, "failed to store reading");
            self.notifier.notify(Notice::error("Failed to save location"));
            return Err(e.into());
        }
        self.stats.persisted += 1;

        let description = format!("Location tracked at {reading}");
        if let Err(e) = self
            .sink
            .log_activity(self.user, ActivityKind::Location, "Location Updated", &description)
            .await
        {
            tracing::error!(user = %self.user, error = %e, "failed to log location activity");
            self.notifier.notify(Notice::error("Failed to log location activity"));
            return Err(e.into());
        }
        Ok(())
    }

    fn handle_fault(&mut self, fault: AcquisitionFault) -> TrackingError {
        self.stats.faults += 1;
        let backend = self
            .run
            .as_ref()
            .map_or(BackendKind::Foreground, |run| run.handle.kind());

        self.notifier.notify(Notice::error(match backend {
            BackendKind::Foreground => "Unable to get location. Please enable location services.",
            BackendKind::Background => "Background tracking error",
        }));
        if fault.fatal {
            self.close_stream("fatal platform error");
        } else {
            tracing::warn!(user = %self.user, %backend, message = %fault.message, "acquisition error");
        }

        TrackingError::Acquisition {
            backend,
            message: fault.message,
            fatal: fault.fatal,
        }
    }

    /// Stop consuming the run's stream; the handle stays owned until `end`
    fn close_stream(&mut self, why: &'static str) {
        if let Some(run) = self.run.as_mut() {
            if run.events.take().is_some() {
                tracing::warn!(user = %self.user, handle = %run.handle, why, "delivery stopped");
            }
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        // Teardown releases exactly like `end`; failures were already reported.
        let _ = self.release("teardown");
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("user", &self.user)
            .field("state", &self.state())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn start_failure_message(kind: BackendKind, error: &TrackingError) -> &'static str {
    match (kind, error) {
        (_, TrackingError::PermissionDenied) => "Location permission denied",
        (BackendKind::Background, _) => "Failed to start background tracking",
        (BackendKind::Foreground, _) => "Geolocation is not supported by your browser",
    }
}
