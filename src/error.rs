use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::weather::WeatherError;
use thiserror::Error;

/// Coarse error class, used for the message shown to the user and as a log label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Permission,
    Network,
    NotFound,
    Validation,
    Config,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Network => "network",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Config => "config",
        }
    }
}

/// Any failure of a user action
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Weather(e) => e.kind(),
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Message for the blocking error prompt
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(e) => e.user_message(),
            Self::Store(StoreError::NotFound(_)) => "That task no longer exists.".to_string(),
            Self::Store(StoreError::Unauthenticated) => {
                "No user logged in. Please log in to view tasks.".to_string()
            }
            Self::Store(_) => "Failed to reach the task store. Please try again.".to_string(),
            Self::Weather(e) => e.to_string(),
            Self::Config(e) => e.to_string(),
            Self::Validation(message) => message.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
