use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named point to fetch weather for. Extra columns in the source are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions as reported by a provider, before they are tied to a city and date.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: String,
}

/// One city's weather reading for a calendar date; one row in the `weather` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub city: String,
    pub date: NaiveDate,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_condition: String,
}

impl WeatherObservation {
    pub fn new(location: &Location, date: NaiveDate, current: CurrentConditions) -> Self {
        Self {
            city: location.city.clone(),
            date,
            temperature: current.temperature,
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            weather_condition: current.condition,
        }
    }
}
