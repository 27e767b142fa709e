use crate::focus::timer::MAX_PHASE_MINUTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing configuration: {0} (set it in config.json or via {1})")]
    Missing(&'static str, &'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// App configuration stored in config.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub board: BoardConfig,
}

/// Managed backend: auth service and document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Web API key of the backend project
    pub api_key: String,
    pub project_id: String,
    pub auth_url: String,
    pub token_url: String,
    pub store_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            auth_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            token_url: "https://securetoken.googleapis.com/v1".to_string(),
            store_url: "https://firestore.googleapis.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org".to_string(),
        }
    }
}

/// Where the device is. `enabled = false` behaves like a refused permission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub work_minutes: u32,
    pub break_minutes: u32,
    /// IIO accelerometer directory, e.g. /sys/bus/iio/devices/iio:device0
    pub motion_device: Option<PathBuf>,
    pub motion_interval_ms: u64,
    pub sounds: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            motion_device: None,
            motion_interval_ms: 1000,
            sounds: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub use_emoji: bool,
    /// Desktop notification when a task's reminder time passes
    pub reminders: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            use_emoji: true,
            reminders: true,
        }
    }
}

impl AppConfig {
    /// Load config.json, falling back to defaults when it doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = crate::persistence::read_optional(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        match content {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        crate::persistence::atomic_write(path, &json).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `TEND_*` environment overrides
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TEND_API_KEY") {
            self.backend.api_key = value;
        }
        if let Some(value) = lookup("TEND_PROJECT_ID") {
            self.backend.project_id = value;
        }
        if let Some(value) = lookup("TEND_AUTH_URL") {
            self.backend.auth_url = value;
        }
        if let Some(value) = lookup("TEND_TOKEN_URL") {
            self.backend.token_url = value;
        }
        if let Some(value) = lookup("TEND_STORE_URL") {
            self.backend.store_url = value;
        }
        if let Some(value) = lookup("TEND_WEATHER_KEY") {
            self.weather.api_key = value;
        }
        if let Some(value) = lookup("TEND_WEATHER_URL") {
            self.weather.base_url = value;
        }
        self
    }

    /// Check that the backend can be reached with this config
    pub fn validate_backend(&self) -> Result<(), ConfigError> {
        if self.backend.api_key.is_empty() {
            return Err(ConfigError::Missing("backend.api_key", "TEND_API_KEY"));
        }
        if self.backend.project_id.is_empty() {
            return Err(ConfigError::Missing("backend.project_id", "TEND_PROJECT_ID"));
        }
        Ok(())
    }

    pub fn validate_focus(&self) -> Result<(), ConfigError> {
        if self.focus.work_minutes == 0 || self.focus.break_minutes == 0 {
            return Err(ConfigError::Invalid(
                "focus.work_minutes and focus.break_minutes must be positive".to_string(),
            ));
        }
        if self.focus.work_minutes > MAX_PHASE_MINUTES || self.focus.break_minutes > MAX_PHASE_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "focus.work_minutes and focus.break_minutes must be at most {MAX_PHASE_MINUTES}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load(temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.focus.work_minutes, 25);
        assert_eq!(config.focus.break_minutes, 5);
        assert!(!config.location.enabled);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"focus": {"work_minutes": 50}, "backend": {"project_id": "p1"}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.focus.work_minutes, 50);
        assert_eq!(config.focus.break_minutes, 5);
        assert_eq!(config.backend.project_id, "p1");
        assert_eq!(config.backend.store_url, "https://firestore.googleapis.com/v1");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.location.enabled = true;
        config.location.latitude = Some(51.5);
        config.location.longitude = Some(-0.12);
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides_and_validation() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate_backend(),
            Err(ConfigError::Missing("backend.api_key", _))
        ));

        let config = config.with_overrides(|key| match key {
            "TEND_API_KEY" => Some("key".to_string()),
            "TEND_PROJECT_ID" => Some("proj".to_string()),
            _ => None,
        });
        assert!(config.validate_backend().is_ok());
        assert_eq!(config.backend.api_key, "key");
    }

    #[test]
    fn test_focus_durations_are_bounded() {
        let mut config = AppConfig::default();
        assert!(config.validate_focus().is_ok());

        config.focus.work_minutes = 99_999_999;
        assert!(matches!(config.validate_focus(), Err(ConfigError::Invalid(_))));

        config.focus.work_minutes = MAX_PHASE_MINUTES;
        config.focus.break_minutes = 0;
        assert!(matches!(config.validate_focus(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
