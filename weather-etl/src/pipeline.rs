//! In-process run of all three stages, plus the whole-pipeline retry used by the CLI.

use std::{future::Future, path::Path, time::Duration};

use crate::{
    error::Result,
    fetcher::fetch_weather,
    locations::load_locations,
    model::Location,
    provider::WeatherProvider,
    store::WeatherStore,
    writer::insert_weather,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub locations: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub inserted: usize,
}

#[derive(Debug)]
pub struct Pipeline<'a> {
    provider: &'a dyn WeatherProvider,
    store: &'a dyn WeatherStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(provider: &'a dyn WeatherProvider, store: &'a dyn WeatherStore) -> Self {
        Self { provider, store }
    }

    /// Load locations from `path`, then fetch and insert.
    pub async fn run_from_file(&self, path: &Path) -> Result<RunSummary> {
        let locations = load_locations(path)?;
        self.run(&locations).await
    }

    pub async fn run(&self, locations: &[Location]) -> Result<RunSummary> {
        let report = fetch_weather(self.provider, locations).await;
        let skipped = report.skipped_count();
        let observations = report.into_observations();

        let inserted = insert_weather(self.store, &observations).await?;

        Ok(RunSummary {
            locations: locations.len(),
            fetched: observations.len(),
            skipped,
            inserted,
        })
    }
}

/// Whole-pipeline retry: `retries` extra attempts after the first, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(5 * 60),
        }
    }
}

impl RetryPolicy {
    /// Run `attempt` until it succeeds or retries run out; returns the last error.
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.retries.saturating_add(1);
        let mut n = 1;
        loop {
            match attempt(n).await {
                Ok(value) => return Ok(value),
                Err(e) if n < attempts => {
                    tracing::warn!(
                        attempt = n,
                        of = attempts,
                        error = %e,
                        retry_in_secs = self.delay.as_secs(),
                        "pipeline run failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    n += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
