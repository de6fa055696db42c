//! Tracking simulator
//!
//! Drives a [`TrackingSession`] against a seeded platform that implements
//! both watch APIs, then checks the session invariants against what the
//! platform and the store observed.

use crate::backend::BackendSet;
use crate::handle::{BackendKind, SessionHandle, WatchId, WatcherId};
use crate::platform::{
    AcquisitionFault, BackgroundGeolocation, CapabilityProbe, ForegroundGeolocation,
    PlatformError, PositionEvent, PositionSender,
};
use crate::session::{SessionStats, TrackingSession};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use trackmaster_core::{
    BackgroundOptions, ForegroundOptions, LocationValidator, MemoryStore, Reading, TrackerConfig,
    TracingNotifier, UserId,
};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Platform callbacks to deliver
    pub readings: u64,
    /// Simulate a native shell (background backend)
    pub native: bool,
    /// Share of readings that violate a bound
    pub invalid_ratio: f64,
    /// Share of callbacks that are transient errors
    pub fault_ratio: f64,
    /// Starting point of the random walk
    pub origin: (f64, f64),
    pub tracker: TrackerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            readings: 100,
            native: false,
            invalid_ratio: 0.10,
            fault_ratio: 0.05,
            origin: (45.0, -122.0),
            tracker: TrackerConfig::default(),
        }
    }
}

/// Invariants checked after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvariantCheck {
    SessionStarted,
    HandleReleasedOnce,
    IdleAfterEnd,
    RepeatedEndIsNoOp,
    InvalidReadingsNeverStored,
    StoredReadingsUnchanged,
}

/// A failed invariant
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub check: InvariantCheck,
    pub details: String,
}

/// Outcome of one simulation
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub backend: Option<BackendKind>,
    pub delivered: u64,
    pub stats: SessionStats,
    pub stored: usize,
    pub watches_started: u64,
    pub watches_released: u64,
    pub violations: Vec<Violation>,
}

impl SimulationReport {
    /// Check if every invariant held
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate a text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== TrackMaster Simulation Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.seed));
        report.push_str(&format!(
            "Backend: {}\n",
            self.backend.map_or("none", BackendKind::as_str)
        ));
        report.push_str(&format!("Delivered: {}\n", self.delivered));
        report.push_str(&format!("Accepted: {}\n", self.stats.accepted));
        report.push_str(&format!("Rejected: {}\n", self.stats.rejected));
        report.push_str(&format!("Faults: {}\n", self.stats.faults));
        report.push_str(&format!("Stored: {}\n", self.stored));
        report.push_str(&format!(
            "Watches: {} started, {} released\n",
            self.watches_started, self.watches_released
        ));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}: {}\n", i + 1, v.check, v.details));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

#[derive(Debug)]
struct PlatformState {
    rng: StdRng,
    position: (f64, f64),
    next_id: u32,
    active: HashMap<SessionHandle, PositionSender>,
    started: u64,
    released: u64,
}

/// Seeded platform implementing both watch APIs
#[derive(Debug)]
pub struct SimulatedPlatform {
    native: bool,
    invalid_ratio: f64,
    fault_ratio: f64,
    state: Mutex<PlatformState>,
}

impl SimulatedPlatform {
    /// Platform for one simulation
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            native: config.native,
            invalid_ratio: config.invalid_ratio,
            fault_ratio: config.fault_ratio,
            state: Mutex::new(PlatformState {
                rng: StdRng::seed_from_u64(config.seed),
                position: config.origin,
                next_id: 0,
                active: HashMap::new(),
                started: 0,
                released: 0,
            }),
        }
    }

    /// Watches started so far
    pub fn watches_started(&self) -> u64 {
        self.state.lock().started
    }

    /// Live watches released so far
    pub fn watches_released(&self) -> u64 {
        self.state.lock().released
    }

    /// Produce one callback on every live watch
    ///
    /// Returns the event, or `None` if no watch is live.
    pub fn tick(&self) -> Option<PositionEvent> {
        let mut state = self.state.lock();
        if state.active.is_empty() {
            return None;
        }

        let event = if state.rng.gen_bool(self.fault_ratio) {
            PositionEvent::Error(AcquisitionFault::transient("position unavailable"))
        } else if state.rng.gen_bool(self.invalid_ratio) {
            let position = state.position;
            PositionEvent::Reading(out_of_bounds(&mut state.rng, position))
        } else {
            PositionEvent::Reading(walk(&mut state))
        };

        // A closed receiver means the session ended the run; the watch
        // stays registered until the backend releases it.
        for tx in state.active.values() {
            let _ = tx.send(event.clone());
        }
        Some(event)
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.lock();
        state.next_id += 1;
        state.next_id
    }

    fn register(&self, handle: SessionHandle, events: PositionSender) {
        let mut state = self.state.lock();
        state.started += 1;
        state.active.insert(handle, events);
    }

    fn unregister(&self, handle: &SessionHandle) -> bool {
        let mut state = self.state.lock();
        let removed = state.active.remove(handle).is_some();
        if removed {
            state.released += 1;
        }
        removed
    }
}

fn walk(state: &mut PlatformState) -> Reading {
    let (lat, lon) = state.position;
    let lat = (lat + state.rng.gen_range(-1e-4..1e-4)).clamp(-90.0, 90.0);
    let lon = (lon + state.rng.gen_range(-1e-4..1e-4)).clamp(-180.0, 180.0);
    state.position = (lat, lon);

    Reading::new(lat, lon, state.rng.gen_range(3.0..25.0))
        .with_altitude(state.rng.gen_range(0.0..500.0))
        .with_speed(state.rng.gen_range(0.0..3.0))
        .with_heading(state.rng.gen_range(0.0..360.0))
}

fn out_of_bounds(rng: &mut StdRng, (lat, lon): (f64, f64)) -> Reading {
    let base = Reading::new(lat, lon, 5.0);
    match rng.gen_range(0..4) {
        0 => Reading { latitude: 90.0 + rng.gen_range(0.001..10.0), ..base },
        1 => Reading { longitude: -180.0 - rng.gen_range(0.001..10.0), ..base },
        2 => Reading { accuracy: 0.0, ..base },
        _ => base.with_altitude(100_000.0 + rng.gen_range(0.0..1000.0)),
    }
}

impl CapabilityProbe for SimulatedPlatform {
    fn native_background_available(&self) -> bool {
        self.native
    }

    fn foreground_available(&self) -> bool {
        true
    }
}

impl ForegroundGeolocation for SimulatedPlatform {
    fn is_supported(&self) -> bool {
        true
    }

    fn watch_position(&self, _options: &ForegroundOptions, events: PositionSender) -> WatchId {
        let id = WatchId(self.next_id());
        self.register(SessionHandle::Foreground(id), events);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.unregister(&SessionHandle::Foreground(id));
    }
}

#[async_trait::async_trait]
impl BackgroundGeolocation for SimulatedPlatform {
    async fn add_watcher(
        &self,
        _options: &BackgroundOptions,
        events: PositionSender,
    ) -> Result<WatcherId, PlatformError> {
        let id = WatcherId(format!("sim-{}", self.next_id()));
        self.register(SessionHandle::Background(id.clone()), events);
        Ok(id)
    }

    fn remove_watcher(&self, id: &WatcherId) -> Result<(), PlatformError> {
        self.unregister(&SessionHandle::Background(id.clone()));
        Ok(())
    }
}

/// Run one simulation
pub async fn run_simulation(config: SimulationConfig) -> SimulationReport {
    let platform = Arc::new(SimulatedPlatform::new(&config));
    let store = Arc::new(MemoryStore::new());
    let backends = BackendSet::from_platform(
        platform.clone(),
        platform.clone(),
        platform.clone(),
        &config.tracker,
    );
    let mut session = TrackingSession::new(
        UserId::new(),
        backends,
        store.clone(),
        Arc::new(TracingNotifier),
    );
    let mut violations = Vec::new();

    let backend = match session.begin().await {
        Ok(kind) => Some(kind),
        Err(e) => {
            violations.push(Violation {
                check: InvariantCheck::SessionStarted,
                details: e.to_string(),
            });
            None
        }
    };

    let mut delivered = 0;
    let mut expected = Vec::new();
    for _ in 0..config.readings {
        let Some(event) = platform.tick() else {
            break;
        };
        delivered += 1;
        if let PositionEvent::Reading(r) = &event {
            if LocationValidator::is_valid(r) {
                expected.push(*r);
            }
        }
        if session.next_event().await.is_none() {
            break;
        }
    }

    let _ = session.end();
    if session.state().is_tracking() {
        violations.push(Violation {
            check: InvariantCheck::IdleAfterEnd,
            details: format!("state after end: {:?}", session.state()),
        });
    }

    let released_after_end = platform.watches_released();
    let _ = session.end();
    if platform.watches_released() != released_after_end {
        violations.push(Violation {
            check: InvariantCheck::RepeatedEndIsNoOp,
            details: "second end released another watch".to_string(),
        });
    }

    if platform.watches_started() != platform.watches_released() {
        violations.push(Violation {
            check: InvariantCheck::HandleReleasedOnce,
            details: format!(
                "{} started, {} released",
                platform.watches_started(),
                platform.watches_released()
            ),
        });
    }

    let stored: Vec<Reading> = store.readings().into_iter().map(|row| row.reading).collect();
    if let Some(bad) = stored.iter().find(|r| !LocationValidator::is_valid(r)) {
        violations.push(Violation {
            check: InvariantCheck::InvalidReadingsNeverStored,
            details: format!("stored out-of-bounds reading {bad:?}"),
        });
    }
    if stored != expected {
        violations.push(Violation {
            check: InvariantCheck::StoredReadingsUnchanged,
            details: format!("{} stored, {} valid delivered", stored.len(), expected.len()),
        });
    }

    SimulationReport {
        seed: config.seed,
        backend,
        delivered,
        stats: session.stats(),
        stored: stored.len(),
        watches_started: platform.watches_started(),
        watches_released: platform.watches_released(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn foreground_simulation_passes() {
        let report = run_simulation(SimulationConfig::default()).await;
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.backend, Some(BackendKind::Foreground));
        assert_eq!(report.watches_started, 1);
        assert_eq!(report.watches_released, 1);
    }

    #[tokio::test]
    async fn background_simulation_passes() {
        let config = SimulationConfig {
            native: true,
            seed: 7,
            ..Default::default()
        };
        let report = run_simulation(config).await;
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.backend, Some(BackendKind::Background));
    }

    #[tokio::test]
    async fn all_invalid_stores_nothing() {
        let config = SimulationConfig {
            invalid_ratio: 1.0,
            fault_ratio: 0.0,
            readings: 20,
            ..Default::default()
        };
        let report = run_simulation(config).await;
        assert!(report.passed());
        assert_eq!(report.stored, 0);
        assert_eq!(report.stats.rejected, 20);
    }

    #[tokio::test]
    async fn same_seed_same_outcome() {
        let a = run_simulation(SimulationConfig::default()).await;
        let b = run_simulation(SimulationConfig::default()).await;
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.stored, b.stored);
    }

    #[test]
    fn text_report_shows_result() {
        let report = SimulationReport {
            seed: 1,
            backend: None,
            delivered: 0,
            stats: SessionStats::default(),
            stored: 0,
            watches_started: 0,
            watches_released: 0,
            violations: vec![Violation {
                check: InvariantCheck::SessionStarted,
                details: "no capability".to_string(),
            }],
        };
        let text = report.generate_text();
        assert!(text.contains("Backend: none"));
        assert!(text.contains("SessionStarted: no capability"));
        assert!(text.contains("FAIL"));
    }
}
