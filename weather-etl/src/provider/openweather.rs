use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::model::{CurrentConditions, Location};

use super::{ProviderError, WeatherProvider};

/// Current-weather client for the OpenWeather `data/2.5/weather` endpoint,
/// or anything that answers with the same body.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    api_key: String,
    timeout: Duration,
    http: Client,
}

impl OpenWeatherProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org/data/2.5/weather";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
            http,
        })
    }

    fn request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError> {
        tracing::debug!(
            city = %location.city,
            lat = location.lat,
            lon = location.lon,
            "requesting current weather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("lat", location.lat), ("lon", location.lon)])
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| self.request_error(e))?;

        if status != StatusCode::OK {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_current(&body)
    }
}

/// Pull temperature, humidity, wind speed and the first condition out of a response body.
pub fn parse_current(body: &str) -> Result<CurrentConditions, ProviderError> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| ProviderError::Malformed("response has no weather entries".to_string()))?;

    Ok(CurrentConditions {
        temperature: parsed.main.temp,
        humidity: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        condition,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
