//! In-process task store, optionally backed by a JSON file (offline mode)

use super::{StoreError, TaskStore};
use crate::auth::AuthSession;
use crate::domain::{NewTask, Task, TaskPatch};
use crate::persistence::{atomic_write, read_optional};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct LocalStore {
    tasks: Mutex<Vec<Task>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Empty store that lives only in memory
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load tasks from `path`, saving back after every change
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let tasks = match read_optional(&path).map_err(|e| StoreError::Local(e.to_string()))? {
            Some(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::Local(format!("{}: {}", path.display(), e)))?,
            None => Vec::new(),
        };
        Ok(Self {
            tasks: Mutex::new(tasks),
            path: Some(path),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Task>>, StoreError> {
        self.tasks
            .lock()
            .map_err(|_| StoreError::Local("task list lock poisoned".to_string()))
    }

    fn persist(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(tasks).map_err(|e| StoreError::Local(e.to_string()))?;
            atomic_write(path, &json).map_err(|e| StoreError::Local(e.to_string()))?;
        }
        Ok(())
    }

    fn position(tasks: &[Task], session: &AuthSession, id: &str) -> Result<usize, StoreError> {
        tasks
            .iter()
            .position(|t| t.id == id && t.owner_id == session.uid)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl TaskStore for LocalStore {
    async fn query_by_owner(&self, session: &AuthSession) -> Result<Vec<Task>, StoreError> {
        let tasks = self.lock()?;
        Ok(tasks
            .iter()
            .filter(|t| t.owner_id == session.uid)
            .cloned()
            .collect())
    }

    async fn get(&self, session: &AuthSession, id: &str) -> Result<Task, StoreError> {
        let tasks = self.lock()?;
        let index = Self::position(&tasks, session, id)?;
        Ok(tasks[index].clone())
    }

    async fn create(&self, _session: &AuthSession, task: NewTask) -> Result<Task, StoreError> {
        let mut tasks = self.lock()?;
        let task = Task::from_new(Uuid::new_v4().simple().to_string(), task);
        tasks.push(task.clone());
        self.persist(&tasks)?;
        debug!(task_id = %task.id, "task created locally");
        Ok(task)
    }

    async fn update(&self, session: &AuthSession, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.lock()?;
        let index = Self::position(&tasks, session, id)?;
        tasks[index].apply(patch);
        self.persist(&tasks)
    }

    async fn delete(&self, session: &AuthSession, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.lock()?;
        let index = Self::position(&tasks, session, id)?;
        tasks.remove(index);
        self.persist(&tasks)
    }

    async fn put_profile(&self, _session: &AuthSession) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn session(uid: &str) -> AuthSession {
        AuthSession::new(uid, "someone@example.com", "token", "refresh", Utc::now())
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = LocalStore::in_memory();
        let me = session("u1");
        let a = store.create(&me, NewTask::new("u1", "A", Utc::now())).await.unwrap();
        let b = store.create(&me, NewTask::new("u1", "B", Utc::now())).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.query_by_owner(&me).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = LocalStore::in_memory();
        let mine = store
            .create(&session("u1"), NewTask::new("u1", "Mine", Utc::now()))
            .await
            .unwrap();

        let other = session("u2");
        assert!(store.query_by_owner(&other).await.unwrap().is_empty());
        assert!(matches!(store.get(&other, &mine.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&other, &mine.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = LocalStore::in_memory();
        let me = session("u1");
        let task = store.create(&me, NewTask::new("u1", "A", Utc::now())).await.unwrap();

        store.update(&me, &task.id, &TaskPatch::completion(Utc::now())).await.unwrap();
        assert!(store.get(&me, &task.id).await.unwrap().completed);

        store.delete(&me, &task.id).await.unwrap();
        assert!(matches!(store.get(&me, &task.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("offline.json");
        let me = session("u1");

        let store = LocalStore::open(path.clone()).unwrap();
        let task = store.create(&me, NewTask::new("u1", "Persist me", Utc::now())).await.unwrap();
        drop(store);

        let reopened = LocalStore::open(path).unwrap();
        let tasks = reopened.query_by_owner(&me).await.unwrap();
        assert_eq!(tasks, vec![task]);
    }
}
