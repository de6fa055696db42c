//! Time tracker flows against in-memory records

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use trackmaster_core::{ActivityKind, UserId};
use trackmaster_productivity::{
    ManualClock, MemoryRecords, ProductivityError, TimeSessionStore, TimeTracker,
};
use trackmaster_test_utils::{FlakySink, RecordingNotifier};

struct Fixture {
    user: UserId,
    records: Arc<MemoryRecords>,
    sink: Arc<FlakySink>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
    tracker: TimeTracker,
}

fn fixture() -> Fixture {
    let user = UserId::new();
    let records = Arc::new(MemoryRecords::new());
    let sink = Arc::new(FlakySink::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));
    let tracker = TimeTracker::with_clock(
        user,
        records.clone(),
        sink.clone(),
        notifier.clone(),
        clock.clone(),
    );
    Fixture {
        user,
        records,
        sink,
        notifier,
        clock,
        tracker,
    }
}

#[tokio::test]
async fn start_then_stop_records_duration() {
    let mut f = fixture();
    f.tracker.start("Deep work", "refactor").await.unwrap();
    f.clock.advance(Duration::seconds(3725));
    assert_eq!(f.tracker.elapsed(), 3725);

    let session = f.tracker.stop().await.unwrap();
    assert_eq!(session.duration_seconds, Some(3725));
    assert!(!session.is_active);
    assert!(f.tracker.active().is_none());

    let stored = f.records.sessions(f.user).await.unwrap();
    assert_eq!(stored, vec![session]);
    assert_eq!(
        f.notifier.last().map(|n| n.message),
        Some("Session ended: 01:02:05".to_string())
    );
}

#[tokio::test]
async fn activity_feed_gets_start_and_end() {
    let mut f = fixture();
    f.tracker.start("Deep work", "").await.unwrap();
    f.clock.advance(Duration::seconds(61));
    f.tracker.stop().await.unwrap();

    let entries = f.sink.store().activities_of(f.user, ActivityKind::Time);
    let titles: Vec<_> = entries.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Time Session Started", "Time Session Ended"]);
    assert_eq!(
        entries[1].description,
        "Completed \"Deep work\" - Duration: 00:01:01"
    );
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let mut f = fixture();
    let err = f.tracker.start("   ", "x").await.unwrap_err();
    assert_eq!(err, ProductivityError::MissingTitle);
    assert!(err.is_input_error());
    assert_eq!(f.notifier.errors(), vec!["Please enter a title".to_string()]);
    assert!(f.records.all_sessions().is_empty());
}

#[tokio::test]
async fn second_start_is_rejected() {
    let mut f = fixture();
    let first = f.tracker.start("a", "").await.unwrap();
    let err = f.tracker.start("b", "").await.unwrap_err();
    assert_eq!(err, ProductivityError::SessionAlreadyActive);
    assert_eq!(f.tracker.active().map(|s| s.id), Some(first));
}

#[tokio::test]
async fn stop_when_idle_is_rejected() {
    let mut f = fixture();
    assert_eq!(f.tracker.elapsed(), 0);
    assert_eq!(
        f.tracker.stop().await.unwrap_err(),
        ProductivityError::NoActiveSession
    );
}

#[tokio::test]
async fn store_failure_on_start_leaves_tracker_idle() {
    let mut f = fixture();
    f.records.set_unavailable(true);
    let err = f.tracker.start("a", "").await.unwrap_err();
    assert!(matches!(err, ProductivityError::Persist(_)));
    assert!(f.tracker.active().is_none());
    assert_eq!(f.notifier.errors(), vec!["Failed to start session".to_string()]);
}

#[tokio::test]
async fn store_failure_on_stop_keeps_session_running() {
    let mut f = fixture();
    f.tracker.start("a", "").await.unwrap();
    f.records.set_unavailable(true);
    assert!(f.tracker.stop().await.is_err());
    assert!(f.tracker.active().is_some());

    f.records.set_unavailable(false);
    f.clock.advance(Duration::seconds(10));
    let session = f.tracker.stop().await.unwrap();
    assert_eq!(session.duration_seconds, Some(10));
}

#[tokio::test]
async fn activity_failure_does_not_fail_the_session() {
    let mut f = fixture();
    f.sink.fail_activities(true);
    assert!(f.tracker.start("a", "").await.is_ok());
    assert!(f.tracker.active().is_some());
    assert_eq!(f.notifier.errors(), vec!["Failed to log activity".to_string()]);
}
