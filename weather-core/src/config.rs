use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that takes precedence over the key stored on disk.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Tunables for the session controller.
///
/// Example TOML:
/// [session]
/// default_city = "Kottawa"
/// debounce_ms = 1200
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// City used at bootstrap when nothing has been persisted yet.
    pub default_city: String,
    /// Quiet interval before search text is sent to the provider.
    pub debounce_ms: u64,
    /// Search text must be at least this many characters.
    pub min_query_len: usize,
    /// Number of forecast days requested.
    pub forecast_days: u8,
    /// Image key used when the condition text is missing or unknown.
    pub fallback_image_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_city: "Kottawa".to_string(),
            debounce_ms: 1200,
            min_query_len: 3,
            forecast_days: 7,
            fallback_image_key: "other".to_string(),
        }
    }
}

impl SessionSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether `query` is long enough to be sent to the search provider.
    pub fn accepts_query(&self, query: &str) -> bool {
        query.chars().count() >= self.min_query_len
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// WeatherAPI.com key.
    pub api_key: Option<String>,

    /// Overrides the provider endpoint, e.g. for a local proxy.
    pub base_url: Option<String>,

    #[serde(default)]
    pub session: SessionSettings,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }
}

/// A non-blank environment value wins over the stored key.
fn pick_api_key(env: Option<String>, stored: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| stored.map(str::to_string))
}
