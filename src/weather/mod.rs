pub mod client;
pub mod countries;

use crate::config::LocationConfig;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::WeatherClient;

/// Weather lookup errors. Each one ends up as the weather panel's message.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Permission to access location was denied")]
    PermissionDenied,

    #[error("Location is enabled but no coordinates are configured")]
    NoPosition,

    #[error("Weather API key is not configured (set weather.api_key or TEND_WEATHER_KEY)")]
    MissingApiKey,

    #[error("Weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected weather response: {0}")]
    Malformed(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::Permission,
            Self::NoPosition | Self::MissingApiKey => ErrorKind::Config,
            Self::Http(_) | Self::Status { .. } | Self::Malformed(_) => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions at the user's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
    pub location_name: String,
    /// Country name, or the raw code when it isn't in the table
    pub country: String,
}

impl Weather {
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }

    /// Rounded temperature, e.g. `18°C`
    pub fn temperature_label(&self) -> String {
        format!("{}°C", self.temperature.round() as i64)
    }

    pub fn place(&self) -> String {
        match (self.location_name.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.location_name, self.country),
            (false, true) => self.location_name.clone(),
            (true, _) => self.country.clone(),
        }
    }

    /// Terminal glyph for the OpenWeatherMap icon code
    pub fn symbol(&self) -> &'static str {
        match self.icon.get(..2).unwrap_or("") {
            "01" => "☀",
            "02" | "03" | "04" => "☁",
            "09" | "10" => "☂",
            "11" => "⚡",
            "13" => "❄",
            "50" => "≋",
            _ => "·",
        }
    }
}

/// Source of the device position
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// Position taken from config.json. A disabled location behaves like a
/// refused permission prompt.
#[derive(Debug, Clone)]
pub struct ConfigLocation {
    config: LocationConfig,
}

impl ConfigLocation {
    pub fn new(config: LocationConfig) -> Self {
        Self { config }
    }
}

impl LocationProvider for ConfigLocation {
    fn current_position(&self) -> Result<Coordinates, WeatherError> {
        if !self.config.enabled {
            return Err(WeatherError::PermissionDenied);
        }
        match (self.config.latitude, self.config.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(WeatherError::NoPosition),
        }
    }
}
