//! Controller state consumed by the renderer.

use chrono::{DateTime, Utc};

use crate::{LocationCandidate, SessionError, WeatherSession};

/// Why a forecast was requested. Only selections are remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Bootstrap,
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub city: String,
    pub origin: FetchOrigin,
}

/// A forecast fetch that failed; holding one is the retry affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFailure {
    pub request: ForecastRequest,
    pub error: SessionError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiVisibilityState {
    pub search_open: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Last successfully loaded session, if any.
    pub session: Option<WeatherSession>,
    /// While set, `session` must not be presented as current.
    pub loading: bool,
    pub search_open: bool,
    pub query: String,
    pub candidates: Vec<LocationCandidate>,
    pub search_error: Option<SessionError>,
    pub forecast_error: Option<ForecastFailure>,
    pub persist_error: Option<SessionError>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            // Nothing to show until the bootstrap fetch lands.
            loading: true,
            search_open: false,
            query: String::new(),
            candidates: Vec::new(),
            search_error: None,
            forecast_error: None,
            persist_error: None,
            loaded_at: None,
        }
    }
}

impl SessionState {
    pub fn visibility(&self) -> UiVisibilityState {
        UiVisibilityState {
            search_open: self.search_open,
            loading: self.loading,
        }
    }

    /// The session, unless a fetch is in progress.
    pub fn displayed_session(&self) -> Option<&WeatherSession> {
        if self.loading {
            None
        } else {
            self.session.as_ref()
        }
    }

    pub fn can_retry(&self) -> bool {
        !self.loading && self.forecast_error.is_some()
    }
}
