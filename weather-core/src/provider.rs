use crate::{
    Config, LocationCandidate, SessionSettings, WeatherSession,
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// Resolves partial city text into an ordered list of candidates.
#[async_trait]
pub trait LocationSearch: Send + Sync + Debug {
    async fn search(&self, city_name: &str) -> anyhow::Result<Vec<LocationCandidate>>;
}

/// Fetches current conditions and the multi-day forecast for a city.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn forecast(&self, city_name: &str) -> anyhow::Result<WeatherSession>;
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<WeatherApiProvider> {
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `weather configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let days = forecast_days(&config.session);
    let provider = WeatherApiProvider::new(api_key).with_forecast_days(days);

    Ok(match &config.base_url {
        Some(url) => provider.with_base_url(url.clone()),
        None => provider,
    })
}

/// WeatherAPI.com serves at most this many forecast days.
const MAX_FORECAST_DAYS: u8 = 14;

/// Configured day count, with 0 meaning "default" and anything above the
/// provider limit capped.
fn forecast_days(settings: &SessionSettings) -> u8 {
    match settings.forecast_days {
        0 => SessionSettings::default().forecast_days,
        days => days.min(MAX_FORECAST_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        // Only meaningful when the override isn't set in the test environment.
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `weather configure`"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());
        cfg.base_url = Some("http://localhost:9".to_string());

        let provider = provider_from_config(&cfg).expect("configured");
        assert_eq!(provider.base_url(), "http://localhost:9");
    }

    #[test]
    fn zero_forecast_days_falls_back_to_default() {
        let settings = SessionSettings {
            forecast_days: 0,
            ..SessionSettings::default()
        };
        assert_eq!(forecast_days(&settings), 7);
    }

    #[test]
    fn forecast_days_are_capped_at_provider_limit() {
        let days = |n| {
            forecast_days(&SessionSettings {
                forecast_days: n,
                ..SessionSettings::default()
            })
        };

        assert_eq!(days(1), 1);
        assert_eq!(days(14), 14);
        assert_eq!(days(30), 14);
        assert_eq!(days(u8::MAX), 14);
    }
}
