//! Dashboard totals

use crate::task::{Task, TaskStatus};
use crate::time::TimeSession;
use serde::{Deserialize, Serialize};

/// Headline numbers for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsOverview {
    pub locations: usize,
    /// Whole hours over finished sessions
    pub hours_tracked: u64,
    pub completed_tasks: usize,
    pub active_sessions: usize,
}

impl StatsOverview {
    #[must_use]
    pub fn compute(location_count: usize, sessions: &[TimeSession], tasks: &[Task]) -> Self {
        let seconds: u64 = sessions.iter().filter_map(|s| s.duration_seconds).sum();
        Self {
            locations: location_count,
            hours_tracked: seconds / 3600,
            completed_tasks: tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .count(),
            active_sessions: sessions.iter().filter(|s| s.is_active).count(),
        }
    }
}
