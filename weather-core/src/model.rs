use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A location returned by the search provider for a partial city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    /// Provider-assigned identifier, carried through untouched.
    #[serde(default)]
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

impl LocationCandidate {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: serde_json::Value::Null,
            name: name.into(),
            region: String::new(),
            country: country.into(),
        }
    }

    /// `"name, country"` as shown in a result row.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// The resolved place a session belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub localtime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

/// Current conditions, in the provider's metric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    #[serde(default)]
    pub feelslike_c: Option<f64>,
    pub condition: Condition,
    pub wind_kph: f64,
    pub humidity: u8,
    #[serde(default)]
    pub last_updated_epoch: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    #[serde(default)]
    pub avgtemp_c: Option<f64>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// One day of the multi-day forecast, read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub astro: Astro,
    #[serde(default)]
    pub day: Option<DaySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Forecast {
    #[serde(rename = "forecastday", default)]
    pub days: Vec<DayForecast>,
}

/// The fully resolved snapshot of what is currently displayed.
///
/// A session is only ever replaced as a whole; nothing patches individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSession {
    pub location: SessionLocation,
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Forecast,
}

impl WeatherSession {
    pub fn today(&self) -> Option<&DayForecast> {
        self.forecast.days.first()
    }
}
