use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::model::{LocationCandidate, WeatherSession};

use super::{ForecastSource, LocationSearch};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com client serving both location search and forecasts.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    forecast_days: u8,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_days: 7,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        what: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, what, "requesting WeatherAPI.com");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to WeatherAPI.com ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read WeatherAPI {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "WeatherAPI {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse WeatherAPI {what} JSON"))
    }
}

#[async_trait]
impl LocationSearch for WeatherApiProvider {
    async fn search(&self, city_name: &str) -> Result<Vec<LocationCandidate>> {
        self.get_json("search.json", "search", &[("q", city_name)]).await
    }
}

#[async_trait]
impl ForecastSource for WeatherApiProvider {
    async fn forecast(&self, city_name: &str) -> Result<WeatherSession> {
        let days = self.forecast_days.to_string();
        self.get_json(
            "forecast.json",
            "forecast",
            &[
                ("q", city_name),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ],
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_body(city: &str) -> serde_json::Value {
        serde_json::json!({
            "location": { "name": city, "region": "", "country": "Sri Lanka" },
            "current": { "temp_c": 29.0, "wind_kph": 9.0, "humidity": 74,
                         "condition": { "text": "Sunny", "icon": "//cdn/113.png" } },
            "forecast": { "forecastday": [
                { "date": "2026-10-16", "astro": { "sunrise": "05:58 AM", "sunset": "06:02 PM" } }
            ] }
        })
    }

    fn provider(server: &MockServer) -> WeatherApiProvider {
        WeatherApiProvider::new("KEY".into()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn search_sends_key_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("key", "KEY"))
            .and(query_param("q", "Lon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 1, "name": "London", "region": "City of London", "country": "UK" },
                { "id": 2, "name": "London", "region": "Ontario", "country": "Canada" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let results = provider(&server).search("Lon").await.expect("search");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label(), "London, UK");
        assert_eq!(results[1].country, "Canada");
    }

    #[tokio::test]
    async fn forecast_requests_configured_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", "Kottawa"))
            .and(query_param("days", "3"))
            .and(query_param("aqi", "no"))
            .and(query_param("alerts", "no"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body("Kottawa")))
            .expect(1)
            .mount(&server)
            .await;

        let session = provider(&server)
            .with_forecast_days(3)
            .forecast("Kottawa")
            .await
            .expect("forecast");

        assert_eq!(session.location.name, "Kottawa");
        assert_eq!(session.forecast.days[0].astro.sunset, "06:02 PM");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":{"code":1006,"message":"No matching location found."}}"#),
            )
            .mount(&server)
            .await;

        let err = provider(&server).forecast("Nowhere").await.unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("400"));
        assert!(msg.contains("No matching location found."));
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).search("Lon").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse WeatherAPI search JSON"));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = format!("{}é{}", "x".repeat(199), "y".repeat(50));
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert!(out.starts_with(&"x".repeat(199)));
    }
}
