//! Core library for the `weather-etl` daily pipeline.
//!
//! Three stages, run in order:
//! - [`locations::load_locations`] reads the city list
//! - [`fetcher::fetch_weather`] asks the weather service about each city, skipping failures
//! - [`writer::insert_weather`] writes one row per observation
//!
//! [`pipeline::Pipeline`] chains them in-process; [`batch`] carries their
//! output across a process boundary when the stages are scheduled separately.

pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod locations;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod writer;

pub use config::{Config, Connection, WeatherApi};
pub use error::EtlError;
pub use fetcher::{FetchOutcome, FetchReport};
pub use model::{CurrentConditions, Location, WeatherObservation};
pub use pipeline::{Pipeline, RetryPolicy, RunSummary};
pub use provider::{OpenWeatherProvider, ProviderError, WeatherProvider};
pub use store::{PgWeatherStore, WeatherStore, WriteMode};
