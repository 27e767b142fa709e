//! OpenWeatherMap current-conditions client

use super::countries::country_name;
use super::{Coordinates, Weather, WeatherError};
use crate::config::WeatherConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: SysBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct SysBlock {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Current conditions at `position`, metric units
    pub async fn current(&self, position: Coordinates) -> Result<Weather, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::MissingApiKey);
        }

        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("APPID", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CurrentResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Malformed(e.to_string()))?;
        let weather = to_weather(parsed)?;
        debug!(place = %weather.place(), temp = weather.temperature, "weather fetched");
        Ok(weather)
    }
}

fn to_weather(response: CurrentResponse) -> Result<Weather, WeatherError> {
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Malformed("no weather conditions".to_string()))?;

    let code = response.sys.country;
    let country = country_name(&code).map(str::to_string).unwrap_or(code);

    Ok(Weather {
        temperature: response.main.temp,
        condition: condition.main,
        icon: condition.icon,
        location_name: response.name,
        country,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HERE: Coordinates = Coordinates {
        latitude: 51.5,
        longitude: -0.12,
    };

    fn client_for(server: &MockServer) -> WeatherClient {
        let config = WeatherConfig {
            api_key: "wkey".to_string(),
            base_url: server.uri(),
        };
        WeatherClient::new(&config, Client::new())
    }

    fn body(name: &str, country: &str) -> serde_json::Value {
        json!({
            "coord": { "lon": -0.12, "lat": 51.5 },
            "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
            "main": { "temp": 17.64, "feels_like": 17.1, "humidity": 70 },
            "sys": { "country": country, "sunrise": 1714536000 },
            "name": name,
            "cod": 200
        })
    }

    #[tokio::test]
    async fn test_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .and(query_param("APPID", "wkey"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body("Paris", "FR")))
            .mount(&server)
            .await;

        let weather = client_for(&server).current(HERE).await.unwrap();
        assert_eq!(
            weather,
            Weather {
                temperature: 17.64,
                condition: "Clouds".to_string(),
                icon: "04d".to_string(),
                location_name: "Paris".to_string(),
                country: "France".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_country_code_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body("London", "QQ")))
            .mount(&server)
            .await;

        let weather = client_for(&server).current(HERE).await.unwrap();
        assert_eq!(weather.country, "QQ");
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
            })))
            .mount(&server)
            .await;

        match client_for(&server).current(HERE).await {
            Err(WeatherError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Invalid API key"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_conditions_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": { "temp": 3.0 }, "weather": [], "name": "Nowhere"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).current(HERE).await;
        assert!(matches!(result, Err(WeatherError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let config = WeatherConfig {
            api_key: "wkey".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        };
        let result = WeatherClient::new(&config, Client::new()).current(HERE).await;
        assert!(matches!(result, Err(WeatherError::Http(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = WeatherClient::new(&WeatherConfig::default(), Client::new());
        assert!(matches!(client.current(HERE).await, Err(WeatherError::MissingApiKey)));
    }
}
