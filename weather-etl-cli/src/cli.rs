use std::{fs, io, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use weather_etl::{
    Config, Connection, EtlError, OpenWeatherProvider, PgWeatherStore, Pipeline, batch,
    config::DATABASE_CONNECTION, fetcher::fetch_weather, locations::load_locations,
    writer::insert_weather,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-etl",
    version,
    about = "Daily weather ETL: locations -> weather API -> PostgreSQL"
)]
pub struct Cli {
    /// Config file. Defaults to config.toml in the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging verbosity: 'trace', 'debug', 'info', 'warn' or 'error'. RUST_LOG wins if set.
    #[arg(long, global = true, default_value_t = Level::INFO)]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load, fetch and insert in one process, retrying the whole run on failure.
    Run {
        /// Locations CSV, overriding `locations_file`.
        #[arg(long)]
        locations: Option<PathBuf>,

        /// PostgreSQL URL, overriding the `postgres_weather_db` connection.
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Extra attempts after a failed run, overriding `retries`.
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Print the locations batch as JSON.
    LoadLocations {
        #[arg(long)]
        locations: Option<PathBuf>,
    },

    /// Read a locations batch and print the observations batch.
    Fetch {
        /// File to read, or '-' for stdin.
        #[arg(long, default_value = "-")]
        input: String,
    },

    /// Read an observations batch and insert it.
    Insert {
        /// File to read, or '-' for stdin.
        #[arg(long, default_value = "-")]
        input: String,

        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
}

/// Log to stderr; stdout is reserved for batch documents.
pub fn init_tracing(level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Run {
                locations,
                database_url,
                retries,
            } => {
                apply_overrides(&mut config, locations, database_url);
                if let Some(retries) = retries {
                    config.retries = retries;
                }
                run_pipeline(&config).await
            }
            Command::LoadLocations { locations } => {
                apply_overrides(&mut config, locations, None);
                let locations = load_locations(&config.locations_file)?;
                println!("{}", batch::encode_locations(&locations)?);
                Ok(())
            }
            Command::Fetch { input } => {
                let locations = batch::decode_locations(&read_input(&input)?)?;
                let provider = weather_provider(&config)?;
                let report = fetch_weather(&provider, &locations).await;
                println!("{}", batch::encode_observations(&report.into_observations())?);
                Ok(())
            }
            Command::Insert {
                input,
                database_url,
            } => {
                apply_overrides(&mut config, None, database_url);
                // validate the whole batch before touching the database
                let observations = batch::decode_observations(&read_input(&input)?)?;
                let store = connect_store(&config).await?;
                insert_weather(&store, &observations).await?;
                Ok(())
            }
        }
    }
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let provider = &weather_provider(config)?;
    let database_url = config.database_url()?;

    let summary = config
        .retry_policy()
        .run(|attempt| async move {
            tracing::info!(
                attempt,
                locations_file = %config.locations_file.display(),
                "starting weather pipeline"
            );
            let store = PgWeatherStore::connect(database_url, config.write_mode)
                .await
                .map_err(EtlError::Connect)?;
            Pipeline::new(provider, &store)
                .run_from_file(&config.locations_file)
                .await
        })
        .await?;

    tracing::info!(
        locations = summary.locations,
        fetched = summary.fetched,
        skipped = summary.skipped,
        inserted = summary.inserted,
        "weather pipeline finished"
    );
    Ok(())
}

fn apply_overrides(config: &mut Config, locations: Option<PathBuf>, database_url: Option<String>) {
    if let Some(path) = locations {
        config.locations_file = path;
    }
    if let Some(host) = database_url {
        config.upsert_connection(
            DATABASE_CONNECTION,
            Connection {
                host,
                api_key: None,
            },
        );
    }
}

fn weather_provider(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api = config.weather_api()?;
    OpenWeatherProvider::new(api.base_url, api.api_key, config.request_timeout())
        .context("Failed to build HTTP client")
}

async fn connect_store(config: &Config) -> anyhow::Result<PgWeatherStore> {
    let store = PgWeatherStore::connect(config.database_url()?, config.write_mode)
        .await
        .map_err(EtlError::Connect)?;
    tracing::debug!(mode = ?store.mode(), "connected to weather database");
    Ok(store)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        io::read_to_string(io::stdin()).context("Failed to read batch from stdin")
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read batch file: {input}"))
    }
}
