//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The search-resolution and weather-session controller
//! - Abstraction over the location search and forecast providers
//! - Persistence of the last chosen city
//! - Shared domain models and the derived view the renderer reads
//! - Configuration handling
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod model;
pub mod provider;
pub mod state;
pub mod store;
pub mod testing;
pub mod view;

pub use config::{Config, SessionSettings};
pub use controller::{Controller, SessionEvent};
pub use error::SessionError;
pub use model::{DayForecast, LocationCandidate, WeatherSession};
pub use provider::{ForecastSource, LocationSearch, provider_from_config};
pub use state::{FetchOrigin, ForecastFailure, ForecastRequest, SessionState, UiVisibilityState};
pub use store::{CITY_KEY, FileStore, KeyValueStore, MemoryStore};
pub use view::{ImageCatalog, WeatherView};
