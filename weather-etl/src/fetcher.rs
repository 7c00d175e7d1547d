//! Weather Fetcher stage.
//!
//! Calls the provider once per location, in order. A failing location is
//! logged and recorded as [`FetchOutcome::Skipped`]; it never stops the loop.

use chrono::Utc;

use crate::{
    model::{Location, WeatherObservation},
    provider::{ProviderError, WeatherProvider},
};

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(WeatherObservation),
    Skipped { city: String, reason: ProviderError },
}

/// Per-location outcomes of one fetch pass, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    pub fn observations(&self) -> impl Iterator<Item = &WeatherObservation> {
        self.outcomes.iter().filter_map(|o| match o {
            FetchOutcome::Fetched(obs) => Some(obs),
            FetchOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &ProviderError)> {
        self.outcomes.iter().filter_map(|o| match o {
            FetchOutcome::Skipped { city, reason } => Some((city.as_str(), reason)),
            FetchOutcome::Fetched(_) => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// Drop the skip records, keeping only the observations.
    pub fn into_observations(self) -> Vec<WeatherObservation> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                FetchOutcome::Fetched(obs) => Some(obs),
                FetchOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}

pub async fn fetch_weather(provider: &dyn WeatherProvider, locations: &[Location]) -> FetchReport {
    let mut outcomes = Vec::with_capacity(locations.len());

    for location in locations {
        let outcome = match provider.current(location).await {
            Ok(current) => {
                let today = Utc::now().date_naive();
                FetchOutcome::Fetched(WeatherObservation::new(location, today, current))
            }
            Err(reason) => {
                log_skip(&location.city, &reason);
                FetchOutcome::Skipped {
                    city: location.city.clone(),
                    reason,
                }
            }
        };
        outcomes.push(outcome);
    }

    let report = FetchReport { outcomes };
    tracing::info!(
        requested = locations.len(),
        skipped = report.skipped_count(),
        "weather fetch finished"
    );
    report
}

fn log_skip(city: &str, reason: &ProviderError) {
    match reason {
        ProviderError::Status { status, body } => {
            tracing::error!(city, status, body = %body, "failed API call");
        }
        other => {
            tracing::error!(city, error = %other, "error fetching weather");
        }
    }
}
