use crate::model::{CurrentConditions, Location};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Why a single location could not be fetched. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions at the location's coordinates.
    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = ProviderError::Status {
            status: 401,
            body: "{\"cod\":401}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("cod"));
    }

    #[test]
    fn timeout_error_mentions_duration() {
        let err = ProviderError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "request timed out after 10s");
    }
}
