//! Fatal pipeline errors.
//!
//! Anything in [`EtlError`] aborts the current run and is left for the caller
//! (scheduler, CLI retry loop) to act on. Per-location fetch failures are not
//! here; see [`crate::provider::ProviderError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stage operations
pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Location file could not be opened
    #[error("failed to open locations file {}", .path.display())]
    LocationsUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Location file is readable but lacks the expected structure
    #[error("locations resource is malformed: {0}")]
    LocationsMalformed(String),

    /// CSV decoding failed partway through the location file
    #[error("failed to read locations")]
    Csv(#[from] csv::Error),

    /// A batch document is not valid JSON, or could not be produced
    #[error("invalid batch document")]
    Json(#[from] serde_json::Error),

    /// The batch decoded but is not a list of records
    #[error("invalid format for weather data: {0}")]
    BatchShape(String),

    /// A record is missing a field or has a field of the wrong type
    #[error("weather record {index} is invalid")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record's date is not an ISO-8601 date or datetime
    #[error("weather record {index} has an unparseable date {value:?}")]
    InvalidDate { index: usize, value: String },

    /// Could not reach the destination database
    #[error("failed to connect to the weather database")]
    Connect(#[source] sqlx::Error),

    /// An INSERT failed; inserts before it are kept
    #[error("failed to write weather record {index} ({city})")]
    Write {
        index: usize,
        city: String,
        #[source]
        source: sqlx::Error,
    },
}
