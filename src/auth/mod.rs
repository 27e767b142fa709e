pub mod credentials;
pub mod identity;
pub mod session;

use crate::error::{AppError, ErrorKind, Result};
use crate::store::TaskStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub use credentials::CredentialFile;
pub use identity::IdentityToolkitAuth;
pub use session::{AuthSession, SessionWatch};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The email address is already in use by another account.")]
    EmailInUse,

    #[error("The email address is badly formatted.")]
    InvalidEmail,

    /// Carries the service's explanation
    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid email or password.")]
    InvalidCredential,

    #[error("Current password is incorrect. Please try again.")]
    WrongCurrentPassword,

    #[error("This account has been disabled.")]
    UserDisabled,

    #[error("Too many attempts. Try again later.")]
    TooManyAttempts,

    /// Refresh token rejected; the user has to log in again
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("No user logged in")]
    NotSignedIn,

    #[error("Auth service error: {0}")]
    Service(String),

    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not save session: {0}")]
    TokenStore(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Status { .. } => ErrorKind::Network,
            Self::TokenStore(_) => ErrorKind::Config,
            Self::WeakPassword(_) | Self::InvalidEmail => ErrorKind::Validation,
            _ => ErrorKind::Auth,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::Status { .. } => {
                "Could not reach the sign-in service. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Account service: sign-up, sign-in and token upkeep
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthSession, AuthError>;

    /// Change the password of the signed-in user. Returns the re-issued session.
    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> std::result::Result<AuthSession, AuthError>;

    /// Exchange the refresh token for a new id token
    async fn refresh(&self, session: &AuthSession) -> std::result::Result<AuthSession, AuthError>;
}

/// Account flows behind the login, register and settings screens.
///
/// Every successful flow publishes the new session on the watch and saves it
/// to the credential file; logout clears both.
pub struct Accounts {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn TaskStore>,
    credentials: Option<CredentialFile>,
    watch: SessionWatch,
}

impl Accounts {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn TaskStore>,
        credentials: Option<CredentialFile>,
        watch: SessionWatch,
    ) -> Self {
        Self {
            auth,
            store,
            credentials,
            watch,
        }
    }

    #[cfg(test)]
    pub fn watch(&self) -> &SessionWatch {
        &self.watch
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Please enter both email and password"));
        }

        let session = self.auth.sign_in(email, password).await?;
        info!(uid = %session.uid, "signed in");
        self.publish(session.clone())?;
        Ok(session)
    }

    /// Create the account, write its profile document and stay signed in
    pub async fn register(&self, email: &str, password: &str, confirm: &str) -> Result<AuthSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() || confirm.is_empty() {
            return Err(AppError::validation("Please fill in all fields"));
        }
        if password != confirm {
            return Err(AppError::validation("Passwords do not match"));
        }

        let session = self.auth.sign_up(email, password).await?;
        info!(uid = %session.uid, "account created");
        self.store.put_profile(&session).await?;
        self.publish(session.clone())?;
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        if let Some(credentials) = &self.credentials {
            credentials.delete()?;
        }
        self.watch.publish(None);
        info!("signed out");
        Ok(())
    }

    /// Re-authenticate with the current password, then set the new one
    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        if new != confirm {
            return Err(AppError::validation("New passwords do not match"));
        }
        let session = self.watch.current().ok_or(AuthError::NotSignedIn)?;

        let verified = match self.auth.sign_in(&session.email, current).await {
            Ok(verified) => verified,
            Err(AuthError::InvalidCredential) => return Err(AuthError::WrongCurrentPassword.into()),
            Err(e) => return Err(e.into()),
        };

        let updated = self.auth.update_password(&verified, new).await?;
        info!(uid = %updated.uid, "password updated");
        self.publish(updated)?;
        Ok(())
    }

    /// Load the saved session, refreshing it if the id token has expired.
    /// A refresh the service rejects signs the user out.
    pub async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(saved) = self.credentials.as_ref().and_then(|c| c.load()) else {
            self.watch.publish(None);
            return Ok(None);
        };

        if !saved.is_expired(Utc::now()) {
            self.watch.publish(Some(saved.clone()));
            return Ok(Some(saved));
        }

        match self.auth.refresh(&saved).await {
            Ok(session) => {
                self.publish(session.clone())?;
                Ok(Some(session))
            }
            Err(AuthError::SessionExpired | AuthError::InvalidCredential | AuthError::UserDisabled) => {
                warn!(uid = %saved.uid, "saved session rejected, signing out");
                self.logout()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current session with a valid id token, refreshing it when needed
    pub async fn fresh_session(&self) -> Result<AuthSession> {
        let session = self.watch.current().ok_or(AuthError::NotSignedIn)?;
        if !session.is_expired(Utc::now()) {
            return Ok(session);
        }
        let session = self.auth.refresh(&session).await?;
        self.publish(session.clone())?;
        Ok(session)
    }

    fn publish(&self, session: AuthSession) -> Result<()> {
        if let Some(credentials) = &self.credentials {
            credentials.store(&session)?;
        }
        self.watch.publish(Some(session));
        Ok(())
    }
}
