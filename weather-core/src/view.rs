//! Read-only projections of a session for the renderer.

use std::collections::HashMap;

use crate::model::{CurrentConditions, DayForecast, SessionLocation, WeatherSession};

/// Condition texts with a dedicated image, and the key each one maps to.
const DEFAULT_IMAGES: &[(&str, &str)] = &[
    ("Partly cloudy", "partlycloudy"),
    ("Moderate rain", "moderaterain"),
    ("Patchy rain possible", "moderaterain"),
    ("Patchy rain nearby", "moderaterain"),
    ("Sunny", "sun"),
    ("Clear", "sun"),
    ("Overcast", "cloud"),
    ("Cloudy", "cloud"),
    ("Light rain", "moderaterain"),
    ("Moderate rain at times", "moderaterain"),
    ("Heavy rain", "heavyrain"),
    ("Heavy rain at times", "heavyrain"),
    ("Moderate or heavy freezing rain", "heavyrain"),
    ("Moderate or heavy rain shower", "heavyrain"),
    ("Moderate or heavy rain with thunder", "heavyrain"),
    ("Mist", "mist"),
];

/// Maps `current.condition.text` to a display image key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCatalog {
    keys: HashMap<String, String>,
    fallback: String,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self::with_fallback("other")
    }
}

impl ImageCatalog {
    /// The built-in table with a custom fallback key.
    pub fn with_fallback(fallback: impl Into<String>) -> Self {
        let keys = DEFAULT_IMAGES
            .iter()
            .map(|(text, key)| (text.to_string(), key.to_string()))
            .collect();
        Self {
            keys,
            fallback: fallback.into(),
        }
    }

    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            keys: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    pub fn insert(&mut self, condition_text: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(condition_text.into(), key.into());
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Exact match on trimmed text first, then case-insensitive.
    pub fn key_for(&self, condition_text: Option<&str>) -> &str {
        let Some(text) = condition_text.map(str::trim).filter(|t| !t.is_empty()) else {
            return &self.fallback;
        };

        if let Some(key) = self.keys.get(text) {
            return key;
        }

        self.keys
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(text))
            .map(|(_, key)| key.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

/// What the renderer reads most often, borrowed from the live session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherView<'a> {
    pub location: &'a SessionLocation,
    pub current: &'a CurrentConditions,
    pub image_key: &'a str,
    pub sunrise: Option<&'a str>,
    pub sunset: Option<&'a str>,
    pub days: &'a [DayForecast],
}

impl<'a> WeatherView<'a> {
    pub fn from_session(session: &'a WeatherSession, images: &'a ImageCatalog) -> Self {
        let today = session.today();
        Self {
            location: &session.location,
            current: &session.current,
            image_key: images.key_for(Some(session.current.condition.text.as_str())),
            sunrise: today.map(|d| d.astro.sunrise.as_str()),
            sunset: today.map(|d| d.astro.sunset.as_str()),
            days: &session.forecast.days,
        }
    }

    /// `"name, country"` header line.
    pub fn title(&self) -> String {
        if self.location.country.is_empty() {
            self.location.name.clone()
        } else {
            format!("{}, {}", self.location.name, self.location.country)
        }
    }
}
