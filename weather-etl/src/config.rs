use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{pipeline::RetryPolicy, store::WriteMode};

/// Connection id holding the weather service base URL (`host`) and `api_key`.
pub const WEATHER_API_CONNECTION: &str = "openweather_api_key";

/// Connection id holding the PostgreSQL URL (`host`).
pub const DATABASE_CONNECTION: &str = "postgres_weather_db";

/// A named external endpoint, with an optional credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Base URL and key for the weather service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherApi {
    pub base_url: String,
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV with `city`, `lat`, `lon` columns.
    pub locations_file: PathBuf,

    pub write_mode: WriteMode,

    /// Per-request timeout for the weather service.
    pub request_timeout_secs: u64,

    /// Extra whole-pipeline attempts after a fatal failure.
    pub retries: u32,
    pub retry_delay_secs: u64,

    /// Example TOML:
    /// [connections.openweather_api_key]
    /// host = "https://api.openweathermap.org/data/2.5/weather"
    /// api_key = "..."
    pub connections: HashMap<String, Connection>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations_file: PathBuf::from("data/locations.csv"),
            write_mode: WriteMode::default(),
            request_timeout_secs: 10,
            retries: 1,
            retry_delay_secs: 300,
            connections: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a named connection.
    pub fn connection(&self, id: &str) -> Result<&Connection> {
        self.connections.get(id).ok_or_else(|| {
            anyhow!(
                "No connection '{id}' configured.\n\
                 Hint: add a [connections.{id}] table to {}.",
                Self::config_file_hint()
            )
        })
    }

    pub fn weather_api(&self) -> Result<WeatherApi> {
        let conn = self.connection(WEATHER_API_CONNECTION)?;
        let api_key = conn.api_key.clone().ok_or_else(|| {
            anyhow!(
                "Connection '{WEATHER_API_CONNECTION}' has no api_key.\n\
                 Hint: set api_key under [connections.{WEATHER_API_CONNECTION}]."
            )
        })?;

        Ok(WeatherApi {
            base_url: conn.host.clone(),
            api_key,
        })
    }

    pub fn database_url(&self) -> Result<&str> {
        Ok(self.connection(DATABASE_CONNECTION)?.host.as_str())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    /// Insert or replace a connection.
    pub fn upsert_connection(&mut self, id: &str, connection: Connection) {
        self.connections.insert(id.to_string(), connection);
    }

    /// Load config from the platform config directory, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-etl", "weather-etl")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn config_file_hint() -> String {
        Self::config_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "the config file".to_string())
    }
}
