//! In-memory time-session and task tables

use crate::task::{Task, TaskId, TaskStore};
use crate::time::{TimeSession, TimeSessionId, TimeSessionStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use trackmaster_core::{PersistError, UserId};

/// Time sessions and tasks kept in memory
///
/// `set_unavailable(true)` makes every write fail with
/// [`PersistError::Unavailable`] until switched back.
#[derive(Debug, Default)]
pub struct MemoryRecords {
    sessions: Mutex<Vec<TimeSession>>,
    tasks: Mutex<Vec<Task>>,
    unavailable: AtomicBool,
}

impl MemoryRecords {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored session
    #[must_use]
    pub fn all_sessions(&self) -> Vec<TimeSession> {
        self.sessions.lock().clone()
    }

    /// Snapshot of every stored task
    #[must_use]
    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    fn check_writable(&self, table: &'static str) -> Result<(), PersistError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable(format!("{table} offline")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TimeSessionStore for MemoryRecords {
    async fn insert_session(&self, session: &TimeSession) -> Result<(), PersistError> {
        self.check_writable("time_sessions")?;
        self.sessions.lock().push(session.clone());
        Ok(())
    }

    async fn finish_session(
        &self,
        id: TimeSessionId,
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    ) -> Result<(), PersistError> {
        self.check_writable("time_sessions")?;
        let mut sessions = self.sessions.lock();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PersistError::NotFound(id.to_string()))?;
        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration_seconds);
        session.is_active = false;
        Ok(())
    }

    async fn sessions(&self, user: UserId) -> Result<Vec<TimeSession>, PersistError> {
        Ok(self
            .sessions
            .lock()
            .iter()
            .filter(|s| s.user == user)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryRecords {
    async fn insert_task(&self, task: &Task) -> Result<(), PersistError> {
        self.check_writable("tasks")?;
        self.tasks.lock().push(task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> Result<(), PersistError> {
        self.check_writable("tasks")?;
        let mut tasks = self.tasks.lock();
        let slot = tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| PersistError::NotFound(task.id.to_string()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), PersistError> {
        self.check_writable("tasks")?;
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(PersistError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn tasks(&self, user: UserId) -> Result<Vec<Task>, PersistError> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.user == user)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};

    fn task(user: UserId) -> Task {
        Task {
            id: TaskId::new(),
            user,
            title: "t".to_string(),
            priority: Priority::High,
            status: TaskStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn tasks_are_scoped_to_user() {
        let records = MemoryRecords::new();
        let alice = UserId::new();
        records.insert_task(&task(alice)).await.unwrap();
        records.insert_task(&task(UserId::new())).await.unwrap();

        assert_eq!(records.tasks(alice).await.unwrap().len(), 1);
        assert_eq!(records.all_tasks().len(), 2);
    }

    #[tokio::test]
    async fn delete_unknown_task_is_not_found() {
        let records = MemoryRecords::new();
        let err = records.delete_task(TaskId::new()).await.unwrap_err();
        assert!(matches!(err, PersistError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_rejects_writes() {
        let records = MemoryRecords::new();
        records.set_unavailable(true);
        let err = records.insert_task(&task(UserId::new())).await.unwrap_err();
        assert!(err.is_retryable());

        records.set_unavailable(false);
        assert!(records.insert_task(&task(UserId::new())).await.is_ok());
    }
}
