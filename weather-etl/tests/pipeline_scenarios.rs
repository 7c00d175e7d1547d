//! End-to-end pipeline scenarios
//!
//! Locations come from a CSV written to the temp dir, the weather service is a
//! canned in-memory provider and the database is a recording store.

use std::{collections::HashMap, path::PathBuf, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use weather_etl::{
    CurrentConditions, EtlError, Location, Pipeline, ProviderError, RunSummary, WeatherObservation,
    WeatherProvider, WeatherStore, batch, fetcher::fetch_weather,
    provider::openweather::parse_current, writer::insert_weather_document,
};

/// Answers from raw JSON bodies, the way the HTTP provider would after a 200.
#[derive(Debug, Default)]
struct CannedProvider {
    bodies: HashMap<String, Result<String, ProviderError>>,
}

impl CannedProvider {
    fn ok(mut self, city: &str, body: &str) -> Self {
        self.bodies.insert(city.to_string(), Ok(body.to_string()));
        self
    }

    fn err(mut self, city: &str, err: ProviderError) -> Self {
        self.bodies.insert(city.to_string(), Err(err));
        self
    }
}

#[async_trait]
impl WeatherProvider for CannedProvider {
    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError> {
        match self.bodies.get(&location.city) {
            Some(Ok(body)) => parse_current(body),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ProviderError::Status {
                status: 404,
                body: "city not found".into(),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct RecordingStore {
    rows: Mutex<Vec<WeatherObservation>>,
}

#[async_trait]
impl WeatherStore for RecordingStore {
    async fn insert(&self, observation: &WeatherObservation) -> Result<(), sqlx::Error> {
        self.rows.lock().unwrap().push(observation.clone());
        Ok(())
    }
}

const AUSTIN_BODY: &str = r#"{"main":{"temp":295.1,"humidity":40},"wind":{"speed":3.2},"weather":[{"description":"clear sky"}]}"#;
const OSLO_BODY: &str = r#"{"main":{"temp":268.4,"humidity":86},"wind":{"speed":5.1},"weather":[{"description":"light snow"}]}"#;

fn write_locations(name: &str, csv: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("weather-etl-{}-{name}.csv", std::process::id()));
    std::fs::write(&path, csv).expect("write temp locations");
    path
}

#[tokio::test]
async fn scenario_a_single_city_single_row() {
    let path = write_locations("scenario-a", "city,lat,lon\nAustin,30.27,-97.74\n");
    let provider = CannedProvider::default().ok("Austin", AUSTIN_BODY);
    let store = RecordingStore::default();

    let summary = Pipeline::new(&provider, &store)
        .run_from_file(&path)
        .await
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        summary,
        RunSummary {
            locations: 1,
            fetched: 1,
            skipped: 0,
            inserted: 1,
        }
    );
    let rows = store.rows.lock().unwrap();
    assert_eq!(
        *rows,
        vec![WeatherObservation {
            city: "Austin".into(),
            date: Utc::now().date_naive(),
            temperature: 295.1,
            humidity: 40.0,
            wind_speed: 3.2,
            weather_condition: "clear sky".into(),
        }]
    );
}

#[tokio::test]
async fn scenario_b_timeout_is_skipped_not_fatal() {
    let locations = vec![
        Location {
            city: "Austin".into(),
            lat: 30.27,
            lon: -97.74,
        },
        Location {
            city: "Oslo".into(),
            lat: 59.91,
            lon: 10.75,
        },
    ];
    let provider = CannedProvider::default()
        .err("Austin", ProviderError::Timeout(Duration::from_secs(10)))
        .ok("Oslo", OSLO_BODY);
    let store = RecordingStore::default();

    let summary = Pipeline::new(&provider, &store)
        .run(&locations)
        .await
        .unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);
    let rows = store.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].city, "Oslo");
}

#[tokio::test]
async fn scenario_c_single_object_is_rejected_before_insert() {
    let store = RecordingStore::default();
    let doc = r#"{"city":"Austin","date":"2025-01-04","temperature":295.1,"humidity":40,"wind_speed":3.2,"weather_condition":"clear sky"}"#;

    let err = insert_weather_document(&store, doc).await.unwrap_err();

    assert!(matches!(err, EtlError::BatchShape(_)));
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn output_is_the_complement_of_failures_in_order() {
    let locations: Vec<Location> = ["Austin", "Nowhere", "Oslo", "Broken"]
        .into_iter()
        .map(|city| Location {
            city: city.into(),
            lat: 0.0,
            lon: 0.0,
        })
        .collect();
    let provider = CannedProvider::default()
        .ok("Austin", AUSTIN_BODY)
        .ok("Oslo", OSLO_BODY)
        .ok("Broken", r#"{"main":{"temp":1.0}}"#);

    let report = fetch_weather(&provider, &locations).await;

    let fetched: Vec<_> = report.observations().map(|o| o.city.as_str()).collect();
    assert_eq!(fetched, vec!["Austin", "Oslo"]);
    let skipped: Vec<_> = report.skipped().map(|(city, _)| city).collect();
    assert_eq!(skipped, vec!["Nowhere", "Broken"]);
}

#[tokio::test]
async fn stages_chain_through_batch_documents() {
    let locations_doc = batch::encode_locations(&[Location {
        city: "Austin".into(),
        lat: 30.27,
        lon: -97.74,
    }])
    .unwrap();
    let provider = CannedProvider::default().ok("Austin", AUSTIN_BODY);
    let store = RecordingStore::default();

    let locations = batch::decode_locations(&locations_doc).unwrap();
    let observations = fetch_weather(&provider, &locations).await.into_observations();
    let observations_doc = batch::encode_observations(&observations).unwrap();
    let written = insert_weather_document(&store, &observations_doc)
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(*store.rows.lock().unwrap(), observations);
}

#[tokio::test]
async fn missing_locations_file_fails_before_any_fetch() {
    let provider = CannedProvider::default();
    let store = RecordingStore::default();

    let err = Pipeline::new(&provider, &store)
        .run_from_file(&PathBuf::from("/definitely/not/here.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::LocationsUnavailable { .. }));
    assert!(store.rows.lock().unwrap().is_empty());
}
