//! TrackMaster Productivity
//!
//! The non-location trackers:
//! - [`TimeTracker`]: one running work session at a time, with elapsed time
//! - [`TaskBoard`]: tasks with priority and progress
//! - [`StatsOverview`]: dashboard totals over stored records
//!
//! Both trackers write through store traits and append to the shared
//! activity feed via [`PersistenceSink`](trackmaster_core::PersistenceSink).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod clock;
pub mod error;
pub mod memory;
pub mod stats;
pub mod task;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ProductivityError;
pub use memory::MemoryRecords;
pub use stats::StatsOverview;
pub use task::{Priority, Task, TaskBoard, TaskId, TaskStatus, TaskStore};
pub use time::{format_duration, TimeSession, TimeSessionId, TimeSessionStore, TimeTracker};
