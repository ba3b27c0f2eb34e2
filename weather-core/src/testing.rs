//! Test doubles for driving the controller without a network.
//!
//! [`ScriptedProvider`] implements both provider traits from an in-memory
//! script, records every call, and can hold individual responses behind a
//! [`Gate`] so tests decide the order in which they land.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::oneshot;

use crate::model::{
    Astro, Condition, CurrentConditions, DayForecast, Forecast, LocationCandidate,
    SessionLocation, WeatherSession,
};
use crate::provider::{ForecastSource, LocationSearch};

/// A believable session for `city` with three forecast days.
pub fn sample_session(city: &str, country: &str, condition: &str) -> WeatherSession {
    let start = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap_or(NaiveDate::MIN);
    let days = start
        .iter_days()
        .take(3)
        .enumerate()
        .map(|(i, date)| DayForecast {
            date,
            astro: Astro {
                sunrise: format!("06:0{} AM", i + 1),
                sunset: format!("06:1{} PM", i + 1),
            },
            day: None,
        })
        .collect();

    WeatherSession {
        location: SessionLocation {
            name: city.to_string(),
            region: String::new(),
            country: country.to_string(),
            localtime: None,
        },
        current: CurrentConditions {
            temp_c: 27.5,
            feelslike_c: Some(30.1),
            condition: Condition {
                text: condition.to_string(),
                icon: "//cdn.weatherapi.com/weather/64x64/day/116.png".to_string(),
            },
            wind_kph: 11.2,
            humidity: 79,
            last_updated_epoch: None,
        },
        forecast: Forecast { days },
    }
}

/// Releases one held response.
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Debug, Default)]
struct Script {
    search_results: HashMap<String, Vec<LocationCandidate>>,
    conditions: HashMap<String, String>,
    failing_searches: HashSet<String>,
    failing_forecasts: HashSet<String>,
    search_gates: HashMap<String, oneshot::Receiver<()>>,
    forecast_gates: HashMap<String, oneshot::Receiver<()>>,
    search_calls: Vec<String>,
    forecast_calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Results returned for an exact query; unknown queries return nothing.
    pub fn with_results(self, query: &str, results: Vec<LocationCandidate>) -> Self {
        self.script().search_results.insert(query.to_string(), results);
        self
    }

    /// Condition text reported for `city`; other cities report "Partly cloudy".
    pub fn with_condition(self, city: &str, condition: &str) -> Self {
        self.script()
            .conditions
            .insert(city.to_string(), condition.to_string());
        self
    }

    pub fn fail_search(&self, query: &str) {
        self.script().failing_searches.insert(query.to_string());
    }

    pub fn fail_forecast(&self, city: &str) {
        self.script().failing_forecasts.insert(city.to_string());
    }

    pub fn heal_forecast(&self, city: &str) {
        self.script().failing_forecasts.remove(city);
    }

    /// Hold the next search for `query` until the returned gate is released.
    pub fn hold_search(&self, query: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.script().search_gates.insert(query.to_string(), rx);
        Gate(tx)
    }

    /// Hold the next forecast for `city` until the returned gate is released.
    pub fn hold_forecast(&self, city: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.script().forecast_gates.insert(city.to_string(), rx);
        Gate(tx)
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.script().search_calls.clone()
    }

    pub fn forecast_calls(&self) -> Vec<String> {
        self.script().forecast_calls.clone()
    }
}

#[async_trait]
impl LocationSearch for ScriptedProvider {
    async fn search(&self, city_name: &str) -> anyhow::Result<Vec<LocationCandidate>> {
        let gate = {
            let mut script = self.script();
            script.search_calls.push(city_name.to_string());
            script.search_gates.remove(city_name)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let script = self.script();
        if script.failing_searches.contains(city_name) {
            return Err(anyhow!("search backend unavailable"));
        }
        Ok(script
            .search_results
            .get(city_name)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ForecastSource for ScriptedProvider {
    async fn forecast(&self, city_name: &str) -> anyhow::Result<WeatherSession> {
        let gate = {
            let mut script = self.script();
            script.forecast_calls.push(city_name.to_string());
            script.forecast_gates.remove(city_name)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let script = self.script();
        if script.failing_forecasts.contains(city_name) {
            return Err(anyhow!("No matching location found for {city_name}"));
        }
        let condition = script
            .conditions
            .get(city_name)
            .map_or("Partly cloudy", String::as_str);
        Ok(sample_session(city_name, "", condition))
    }
}
