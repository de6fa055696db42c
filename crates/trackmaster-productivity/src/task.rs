//! Task board
//!
//! Progress drives status: 100 completes a task and stamps `completed_at`,
//! any other value puts it back in progress.

use crate::clock::{Clock, SystemClock};
use crate::error::ProductivityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use trackmaster_core::{ActivityKind, Notice, Notifier, PersistError, PersistenceSink, UserId};
use uuid::Uuid;

/// Task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user: UserId,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Percent, 0..=100
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Apply a progress value and the status it implies
    fn set_progress(&mut self, progress: u8, now: DateTime<Utc>) {
        self.progress = progress;
        if progress == 100 {
            self.status = TaskStatus::Completed;
            self.completed_at = Some(now);
        } else {
            self.status = TaskStatus::InProgress;
            self.completed_at = None;
        }
    }
}

/// Storage for tasks
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), PersistError>;

    /// Replace a stored task; `NotFound` if absent
    async fn update_task(&self, task: &Task) -> Result<(), PersistError>;

    /// Remove a task; `NotFound` if absent
    async fn delete_task(&self, id: TaskId) -> Result<(), PersistError>;

    async fn tasks(&self, user: UserId) -> Result<Vec<Task>, PersistError>;
}

/// One user's tasks
pub struct TaskBoard {
    user: UserId,
    store: Arc<dyn TaskStore>,
    sink: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl TaskBoard {
    #[must_use]
    pub fn new(
        user: UserId,
        store: Arc<dyn TaskStore>,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_clock(user, store, sink, notifier, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        user: UserId,
        store: Arc<dyn TaskStore>,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user,
            store,
            sink,
            notifier,
            clock,
        }
    }

    /// Create a pending task
    ///
    /// # Errors
    /// - `MissingTitle` for a blank title
    /// - `Persist` if the store rejects the task
    pub async fn add(&self, title: &str, priority: Priority) -> Result<Task, ProductivityError> {
        let title = title.trim();
        if title.is_empty() {
            self.notifier.notify(Notice::error("Please enter a task title"));
            return Err(ProductivityError::MissingTitle);
        }

        let task = Task {
            id: TaskId::new(),
            user: self.user,
            title: title.to_string(),
            priority,
            status: TaskStatus::Pending,
            progress: 0,
            created_at: self.clock.now(),
            completed_at: None,
        };

        if let Err(e) = self.store.insert_task(&task).await {
            tracing::error!(user = %self.user, error = %e, "failed to add task");
            self.notifier.notify(Notice::error("Failed to add task"));
            return Err(e.into());
        }

        tracing::info!(user = %self.user, task = %task.id, ?priority, "task added");
        self.notifier.notify(Notice::success("Task added successfully"));
        if let Err(e) = self
            .sink
            .log_activity(
                self.user,
                ActivityKind::Task,
                "Task Created",
                &format!("Created task: \"{title}\""),
            )
            .await
        {
            tracing::warn!(user = %self.user, error = %e, "failed to log task activity");
            self.notifier.notify(Notice::error("Failed to log activity"));
        }
        Ok(task)
    }

    /// Set progress and derived status
    ///
    /// # Errors
    /// - `InvalidProgress` above 100
    /// - `TaskNotFound` for an unknown id
    /// - `Persist` if the store rejects the update
    pub async fn set_progress(&self, id: TaskId, progress: u8) -> Result<Task, ProductivityError> {
        if progress > 100 {
            return Err(ProductivityError::InvalidProgress(progress));
        }

        let mut task = self
            .store
            .tasks(self.user)
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(ProductivityError::TaskNotFound(id))?;

        task.set_progress(progress, self.clock.now());
        match self.store.update_task(&task).await {
            Ok(()) => {
                tracing::debug!(task = %id, progress, status = ?task.status, "task progress updated");
                Ok(task)
            }
            Err(PersistError::NotFound(_)) => Err(ProductivityError::TaskNotFound(id)),
            Err(e) => {
                self.notifier.notify(Notice::error("Failed to update task"));
                Err(e.into())
            }
        }
    }

    /// Delete a task
    ///
    /// # Errors
    /// - `TaskNotFound` for an unknown id
    /// - `Persist` if the store rejects the delete
    pub async fn delete(&self, id: TaskId) -> Result<(), ProductivityError> {
        match self.store.delete_task(id).await {
            Ok(()) => {
                tracing::info!(user = %self.user, task = %id, "task deleted");
                self.notifier.notify(Notice::success("Task deleted"));
                Ok(())
            }
            Err(PersistError::NotFound(_)) => Err(ProductivityError::TaskNotFound(id)),
            Err(e) => {
                self.notifier.notify(Notice::error("Failed to delete task"));
                Err(e.into())
            }
        }
    }

    /// All tasks, newest first
    ///
    /// # Errors
    /// `Persist` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Task>, ProductivityError> {
        let mut tasks = self.store.tasks(self.user).await?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}

impl fmt::Debug for TaskBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskBoard")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: TaskId::new(),
            user: UserId::new(),
            title: "write report".to_string(),
            priority: Priority::default(),
            status: TaskStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn default_priority_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn full_progress_completes() {
        let mut t = task();
        let now = Utc::now();
        t.set_progress(100, now);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_at, Some(now));
    }

    #[test]
    fn lowering_progress_reopens() {
        let mut t = task();
        t.set_progress(100, Utc::now());
        t.set_progress(40, Utc::now());
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn zero_progress_is_in_progress() {
        let mut t = task();
        t.set_progress(0, Utc::now());
        assert_eq!(t.status, TaskStatus::InProgress);
    }

    #[test]
    fn status_storage_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
