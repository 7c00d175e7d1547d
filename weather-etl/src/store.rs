//! Destination table access.
//!
//! The `weather` table must already exist; nothing here creates or migrates it.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::model::WeatherObservation;

/// How a row is written when one for the same city and date may already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Plain INSERT; a re-run for the same day adds duplicate rows.
    #[default]
    Append,
    /// INSERT .. ON CONFLICT (city, date) DO UPDATE. Needs a unique constraint on (city, date).
    Upsert,
}

#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    async fn insert(&self, observation: &WeatherObservation) -> Result<(), sqlx::Error>;
}

const APPEND_SQL: &str = r#"
    INSERT INTO weather (city, date, temperature, humidity, wind_speed, weather_condition)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const UPSERT_SQL: &str = r#"
    INSERT INTO weather (city, date, temperature, humidity, wind_speed, weather_condition)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (city, date) DO UPDATE SET
        temperature = EXCLUDED.temperature,
        humidity = EXCLUDED.humidity,
        wind_speed = EXCLUDED.wind_speed,
        weather_condition = EXCLUDED.weather_condition
"#;

fn insert_sql(mode: WriteMode) -> &'static str {
    match mode {
        WriteMode::Append => APPEND_SQL,
        WriteMode::Upsert => UPSERT_SQL,
    }
}

#[derive(Debug, Clone)]
pub struct PgWeatherStore {
    pool: PgPool,
    mode: WriteMode,
}

impl PgWeatherStore {
    pub fn new(pool: PgPool, mode: WriteMode) -> Self {
        Self { pool, mode }
    }

    /// Open a small pool; the writer only ever runs one statement at a time.
    pub async fn connect(database_url: &str, mode: WriteMode) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self::new(pool, mode))
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }
}

#[async_trait]
impl WeatherStore for PgWeatherStore {
    async fn insert(&self, observation: &WeatherObservation) -> Result<(), sqlx::Error> {
        sqlx::query(insert_sql(self.mode))
            .bind(&observation.city)
            .bind(observation.date)
            .bind(observation.temperature)
            .bind(observation.humidity)
            .bind(observation.wind_speed)
            .bind(&observation.weather_condition)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_a_plain_insert() {
        let sql = insert_sql(WriteMode::Append);
        assert!(sql.contains("INSERT INTO weather"));
        assert!(!sql.contains("ON CONFLICT"));
    }

    #[test]
    fn upsert_keys_on_city_and_date() {
        assert!(insert_sql(WriteMode::Upsert).contains("ON CONFLICT (city, date) DO UPDATE"));
    }

    #[test]
    fn write_mode_reads_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: WriteMode,
        }
        let w: Wrapper = toml::from_str("mode = \"upsert\"").unwrap();
        assert_eq!(w.mode, WriteMode::Upsert);
        assert_eq!(WriteMode::default(), WriteMode::Append);
    }
}
