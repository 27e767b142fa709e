//! Remote collaborators and the user actions built on them

use crate::auth::{Accounts, AuthSession, CredentialFile, IdentityToolkitAuth, SessionWatch};
use crate::config::AppConfig;
use crate::domain::{NewTask, Task, TaskPatch};
use crate::error::{AppError, Result};
use crate::store::{FirestoreStore, LocalStore, StoreError, TaskStore};
use crate::weather::{ConfigLocation, LocationProvider, Weather, WeatherClient};
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared handles to the store, the account service and the weather lookup.
/// Cheap to clone into background jobs.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn TaskStore>,
    /// `None` in offline mode
    pub accounts: Option<Arc<Accounts>>,
    pub watch: SessionWatch,
    pub weather: Arc<WeatherClient>,
    pub location: Arc<dyn LocationProvider>,
}

impl Services {
    /// Backend-connected services; the saved session is not restored yet
    pub fn connect(config: &AppConfig, session_file: PathBuf) -> Result<Self> {
        config.validate_backend()?;
        let client = http_client()?;

        let store: Arc<dyn TaskStore> = Arc::new(FirestoreStore::new(&config.backend, client.clone()));
        let auth = Arc::new(IdentityToolkitAuth::new(&config.backend, client.clone()));
        let watch = SessionWatch::default();
        let accounts = Accounts::new(auth, store.clone(), Some(CredentialFile::new(session_file)), watch.clone());

        Ok(Self {
            store,
            accounts: Some(Arc::new(accounts)),
            watch,
            weather: Arc::new(WeatherClient::new(&config.weather, client)),
            location: Arc::new(ConfigLocation::new(config.location.clone())),
        })
    }

    /// Tasks kept in a local JSON file, always signed in as the local user
    pub fn offline(config: &AppConfig, tasks_file: PathBuf) -> Result<Self> {
        let store: Arc<dyn TaskStore> = Arc::new(LocalStore::open(tasks_file)?);
        Self::with_store(config, store)
    }

    /// Offline services over any store (used by tests)
    pub fn with_store(config: &AppConfig, store: Arc<dyn TaskStore>) -> Result<Self> {
        Ok(Self {
            store,
            accounts: None,
            watch: SessionWatch::new(Some(AuthSession::local())),
            weather: Arc::new(WeatherClient::new(&config.weather, http_client()?)),
            location: Arc::new(ConfigLocation::new(config.location.clone())),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.accounts.is_none()
    }

    pub fn accounts(&self) -> Result<&Accounts> {
        self.accounts
            .as_deref()
            .ok_or_else(|| AppError::validation("Accounts are not available in offline mode"))
    }

    /// Restore the saved session, if any
    pub async fn restore(&self) -> Result<Option<AuthSession>> {
        match &self.accounts {
            Some(accounts) => accounts.restore().await,
            None => Ok(self.watch.current()),
        }
    }

    /// Signed-in session with a usable token
    pub async fn session(&self) -> Result<AuthSession> {
        match &self.accounts {
            Some(accounts) => accounts.fresh_session().await.map_err(|e| match e {
                AppError::Auth(crate::auth::AuthError::NotSignedIn) => StoreError::Unauthenticated.into(),
                other => other,
            }),
            None => self.watch.current().ok_or_else(|| StoreError::Unauthenticated.into()),
        }
    }

    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        let session = self.session().await?;
        Ok(self.store.query_by_owner(&session).await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let session = self.session().await?;
        Ok(self.store.get(&session, id).await?)
    }

    /// Create a task owned by the signed-in user
    pub async fn add_task(&self, mut task: NewTask) -> Result<Task> {
        let session = self
            .session()
            .await
            .map_err(|e| match e {
                AppError::Store(StoreError::Unauthenticated) => {
                    AppError::validation("You must be logged on to add a task")
                }
                other => other,
            })?;
        task.title = task.title.trim().to_string();
        if task.title.is_empty() {
            return Err(AppError::validation("Please enter a task title"));
        }
        task.owner_id = session.uid.clone();

        let created = self.store.create(&session, task).await?;
        info!(task_id = %created.id, "task added");
        Ok(created)
    }

    pub async fn edit_task(&self, id: &str, patch: TaskPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(AppError::validation("Please enter a task title"));
            }
        }
        let session = self.session().await?;
        Ok(self.store.update(&session, id, &patch).await?)
    }

    pub async fn complete_task(&self, id: &str) -> Result<()> {
        let session = self.session().await?;
        Ok(self.store.update(&session, id, &TaskPatch::completion(Utc::now())).await?)
    }

    pub async fn reopen_task(&self, id: &str) -> Result<()> {
        let session = self.session().await?;
        Ok(self.store.update(&session, id, &TaskPatch::reopening()).await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let session = self.session().await?;
        Ok(self.store.delete(&session, id).await?)
    }

    /// Position, then current conditions there
    pub async fn fetch_weather(&self) -> Result<Weather> {
        let position = self.location.current_position()?;
        Ok(self.weather.current(position).await?)
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("tend/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StoreError::Http(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::LOCAL_UID;
    use pretty_assertions::assert_eq;

    fn services() -> Services {
        Services::with_store(&AppConfig::default(), Arc::new(LocalStore::in_memory())).unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_owner_and_trims_title() {
        let services = services();
        let task = services
            .add_task(NewTask::new("someone-else", "  Buy milk ", Utc::now()))
            .await
            .unwrap();
        assert_eq!(task.owner_id, LOCAL_UID);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(services.load_tasks().await.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn test_add_requires_title() {
        let result = services().add_task(NewTask::new(LOCAL_UID, "   ", Utc::now())).await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "Please enter a task title"));
    }

    #[tokio::test]
    async fn test_add_requires_session() {
        let services = services();
        services.watch.publish(None);
        let result = services.add_task(NewTask::new(LOCAL_UID, "Buy milk", Utc::now())).await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "You must be logged on to add a task"));
        assert!(matches!(services.load_tasks().await, Err(AppError::Store(StoreError::Unauthenticated))));
    }

    #[tokio::test]
    async fn test_complete_reopen_delete() {
        let services = services();
        let task = services
            .add_task(NewTask::new(LOCAL_UID, "Buy milk", Utc::now()))
            .await
            .unwrap();

        services.complete_task(&task.id).await.unwrap();
        let done = services.get_task(&task.id).await.unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        services.reopen_task(&task.id).await.unwrap();
        let open = services.get_task(&task.id).await.unwrap();
        assert!(!open.completed);
        assert_eq!(open.completed_at, None);

        services.delete_task(&task.id).await.unwrap();
        assert!(matches!(
            services.delete_task(&task.id).await,
            Err(AppError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_edit_rejects_blank_title() {
        let services = services();
        let patch = TaskPatch {
            title: Some(" ".to_string()),
            ..TaskPatch::default()
        };
        assert!(matches!(services.edit_task("any", patch).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_weather_without_location_permission() {
        let result = services().fetch_weather().await;
        match result {
            Err(e) => assert_eq!(e.user_message(), "Permission to access location was denied"),
            Ok(_) => panic!("weather fetched without a position"),
        }
    }

    #[test]
    fn test_offline_has_no_accounts() {
        let services = services();
        assert!(services.is_offline());
        assert!(services.accounts().is_err());
    }
}
