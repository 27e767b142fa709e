pub mod codec;
pub mod firestore;
pub mod local;

use crate::auth::AuthSession;
use crate::domain::{NewTask, Task, TaskPatch};
use crate::error::ErrorKind;
use async_trait::async_trait;
use thiserror::Error;

pub use firestore::FirestoreStore;
pub use local::LocalStore;

/// Task store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No signed-in user to scope the request to
    #[error("No user logged in")]
    Unauthenticated,

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed document: {0}")]
    Decode(String),

    #[error("Local store error: {0}")]
    Local(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Auth,
            Self::Status { status: 401 | 403, .. } => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Local(_) => ErrorKind::Config,
            _ => ErrorKind::Network,
        }
    }
}

/// Remote collection of tasks, scoped to the signed-in owner
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task owned by the session's user. No server-side filtering.
    async fn query_by_owner(&self, session: &AuthSession) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, session: &AuthSession, id: &str) -> Result<Task, StoreError>;

    /// Store a new task; the store assigns its id
    async fn create(&self, session: &AuthSession, task: NewTask) -> Result<Task, StoreError>;

    async fn update(&self, session: &AuthSession, id: &str, patch: &TaskPatch) -> Result<(), StoreError>;

    async fn delete(&self, session: &AuthSession, id: &str) -> Result<(), StoreError>;

    /// Write the `users/{uid}` profile document on sign-up
    async fn put_profile(&self, session: &AuthSession) -> Result<(), StoreError>;
}
