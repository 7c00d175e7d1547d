//! JSON documents passed between stages when they run as separate processes.
//!
//! Both batch kinds are a JSON array of objects. Observation documents are
//! checked strictly on the way in: the whole document must be list-shaped
//! and every record complete before anything is handed to the writer.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{EtlError, Result},
    model::{Location, WeatherObservation},
};

pub fn encode_locations(locations: &[Location]) -> Result<String> {
    Ok(serde_json::to_string(locations)?)
}

pub fn decode_locations(document: &str) -> Result<Vec<Location>> {
    Ok(serde_json::from_str(document)?)
}

pub fn encode_observations(observations: &[WeatherObservation]) -> Result<String> {
    Ok(serde_json::to_string(observations)?)
}

/// Observation record as it appears on the wire, date still as text.
#[derive(Debug, Deserialize)]
struct RawObservation {
    city: String,
    date: String,
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    weather_condition: String,
}

/// Validate and decode an observation document.
///
/// Shape is checked for the whole document first, then each record is decoded
/// and its date normalized. Any failure rejects the entire batch.
pub fn decode_observations(document: &str) -> Result<Vec<WeatherObservation>> {
    let value: Value = serde_json::from_str(document)?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(EtlError::BatchShape(format!(
                "expected a list of records, found {}",
                kind(&other)
            )));
        }
    };

    if let Some((index, item)) = items.iter().enumerate().find(|(_, v)| !v.is_object()) {
        return Err(EtlError::BatchShape(format!(
            "expected a list of records, element {index} is {}",
            kind(item)
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_record(index, item))
        .collect()
}

fn decode_record(index: usize, item: Value) -> Result<WeatherObservation> {
    let raw: RawObservation =
        serde_json::from_value(item).map_err(|source| EtlError::InvalidRecord { index, source })?;

    let date = parse_iso_date(&raw.date).ok_or_else(|| EtlError::InvalidDate {
        index,
        value: raw.date.clone(),
    })?;

    Ok(WeatherObservation {
        city: raw.city,
        date,
        temperature: raw.temperature,
        humidity: raw.humidity,
        wind_speed: raw.wind_speed,
        weather_condition: raw.weather_condition,
    })
}

/// Calendar date of an ISO-8601 date or datetime, as written (no timezone conversion).
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a single record",
    }
}
