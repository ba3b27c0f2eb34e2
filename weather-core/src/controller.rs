//! Search-resolution and weather-session controller.
//!
//! The controller owns all session state and is the only thing that mutates it.
//! Provider calls run as spawned tasks that post a [`SessionEvent`] back on the
//! controller's channel; the owner feeds those events to [`Controller::handle`]
//! (usually via [`Controller::pump`]) on its single event loop.
//!
//! Every request carries a generation number. A response whose generation is no
//! longer current is dropped, so a late search result can never repopulate a
//! closed search surface and a superseded forecast can never overwrite a newer
//! selection.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::debounce::Debouncer;
use crate::error::SessionError;
use crate::model::{LocationCandidate, WeatherSession};
use crate::provider::{ForecastSource, LocationSearch};
use crate::state::{
    FetchOrigin, ForecastFailure, ForecastRequest, SessionState, UiVisibilityState,
};
use crate::store::{CITY_KEY, KeyValueStore};
use crate::view::{ImageCatalog, WeatherView};
use crate::SessionSettings;

/// Completion of a provider call, posted back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SearchDidLoad {
        generation: u64,
        query: String,
        result: Result<Vec<LocationCandidate>, SessionError>,
    },
    ForecastDidLoad {
        generation: u64,
        request: ForecastRequest,
        result: Result<WeatherSession, SessionError>,
    },
}

pub struct Controller {
    settings: SessionSettings,
    images: ImageCatalog,
    search: Arc<dyn LocationSearch>,
    forecast: Arc<dyn ForecastSource>,
    store: Arc<dyn KeyValueStore>,

    state: SessionState,
    activated: bool,

    search_generation: u64,
    search_pending: bool,
    forecast_generation: u64,
    forecast_pending: bool,

    debouncer: Debouncer<SessionEvent>,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Controller {
    pub fn new(
        settings: SessionSettings,
        search: Arc<dyn LocationSearch>,
        forecast: Arc<dyn ForecastSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(settings.debounce(), tx.clone());
        let images = ImageCatalog::with_fallback(settings.fallback_image_key.clone());

        Self {
            settings,
            images,
            search,
            forecast,
            store,
            state: SessionState::default(),
            activated: false,
            search_generation: 0,
            search_pending: false,
            forecast_generation: 0,
            forecast_pending: false,
            debouncer,
            tx,
            rx,
        }
    }

    /// Replace the condition-text to image-key table.
    pub fn with_image_catalog(mut self, images: ImageCatalog) -> Self {
        self.images = images;
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn visibility(&self) -> UiVisibilityState {
        self.state.visibility()
    }

    /// Candidates the renderer may show right now.
    pub fn visible_candidates(&self) -> &[LocationCandidate] {
        if self.state.search_open && self.settings.accepts_query(&self.state.query) {
            &self.state.candidates
        } else {
            &[]
        }
    }

    /// Projection of the displayed session, `None` while loading or before any load.
    pub fn view(&self) -> Option<WeatherView<'_>> {
        self.state
            .displayed_session()
            .map(|session| WeatherView::from_session(session, &self.images))
    }

    /// Whether any request is still outstanding.
    pub fn is_busy(&self) -> bool {
        self.forecast_pending || self.search_pending
    }

    // ===== Bootstrap =====

    /// Restore the last selected city (or the default) and request its forecast.
    ///
    /// Runs once per controller; later calls return `false` and do nothing.
    pub fn activate(&mut self) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;

        let city = match self.store.get(CITY_KEY) {
            Ok(Some(city)) if !city.trim().is_empty() => city,
            Ok(_) => self.settings.default_city.clone(),
            Err(e) => {
                tracing::warn!(
                    error = %SessionError::persistence(&e),
                    "falling back to default city"
                );
                self.settings.default_city.clone()
            }
        };

        tracing::info!(%city, "bootstrapping weather session");
        self.request_forecast(ForecastRequest {
            city,
            origin: FetchOrigin::Bootstrap,
        });
        true
    }

    // ===== Search surface =====

    pub fn open_search(&mut self) -> bool {
        if self.state.search_open {
            return false;
        }
        self.state.search_open = true;
        true
    }

    /// Close the search surface, dropping its query, candidates and any pending lookup.
    pub fn close_search(&mut self) -> bool {
        let was_open = self.state.search_open;
        self.state.search_open = false;
        self.reset_search();
        was_open
    }

    pub fn toggle_search(&mut self) -> bool {
        if self.state.search_open {
            self.close_search()
        } else {
            self.open_search()
        }
    }

    /// Feed the latest search text. Ignored while the search surface is closed.
    pub fn query_changed(&mut self, text: &str) -> bool {
        if !self.state.search_open {
            return false;
        }

        self.state.query = text.to_string();
        self.search_generation += 1;

        if !self.settings.accepts_query(text) {
            self.debouncer.cancel();
            self.search_pending = false;
            self.state.candidates.clear();
            self.state.search_error = None;
            return true;
        }

        let generation = self.search_generation;
        let query = text.to_string();
        let search = Arc::clone(&self.search);
        tracing::trace!(%query, generation, "debouncing location search");
        self.search_pending = true;

        self.debouncer.schedule(async move {
            tracing::debug!(%query, "searching locations");
            let result = search
                .search(&query)
                .await
                .map_err(|e| SessionError::search(&e));
            SessionEvent::SearchDidLoad {
                generation,
                query,
                result,
            }
        });
        true
    }

    // ===== Selection =====

    /// Switch to `candidate`: close search, enter loading and fetch its forecast.
    pub fn select(&mut self, candidate: &LocationCandidate) {
        self.state.search_open = false;
        self.reset_search();

        self.request_forecast(ForecastRequest {
            city: candidate.name.clone(),
            origin: FetchOrigin::Selection,
        });
    }

    /// Select by position in the visible candidate list.
    pub fn select_index(&mut self, index: usize) -> bool {
        let candidate = self.visible_candidates().get(index).cloned();
        match candidate {
            Some(candidate) => {
                self.select(&candidate);
                true
            }
            None => false,
        }
    }

    /// Re-issue the last failed forecast request.
    pub fn retry(&mut self) -> bool {
        if !self.state.can_retry() {
            return false;
        }
        match self.state.forecast_error.take() {
            Some(failure) => {
                self.request_forecast(failure.request);
                true
            }
            None => false,
        }
    }

    // ===== Event loop =====

    /// Wait for the next completion from spawned work.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Receive and apply one event. Returns whether state changed.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Apply events until nothing is outstanding.
    pub async fn settle(&mut self) {
        loop {
            while let Ok(event) = self.rx.try_recv() {
                self.handle(event);
            }
            if !self.is_busy() {
                break;
            }
            self.pump().await;
        }
    }

    /// Apply one completion event. Returns whether state changed.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::SearchDidLoad {
                generation,
                query,
                result,
            } => {
                if generation != self.search_generation || !self.state.search_open {
                    tracing::debug!(%query, generation, "dropping stale search response");
                    return false;
                }
                self.search_pending = false;
                match result {
                    Ok(candidates) => {
                        tracing::debug!(%query, count = candidates.len(), "search results");
                        self.state.candidates = candidates;
                        self.state.search_error = None;
                    }
                    Err(e) => {
                        tracing::warn!(%query, error = %e, "location search failed");
                        self.state.search_error = Some(e);
                    }
                }
                true
            }

            SessionEvent::ForecastDidLoad {
                generation,
                request,
                result,
            } => {
                if generation != self.forecast_generation {
                    tracing::debug!(
                        city = %request.city,
                        generation,
                        "dropping superseded forecast"
                    );
                    return false;
                }
                self.forecast_pending = false;
                self.state.loading = false;

                match result {
                    Ok(session) => {
                        self.state.session = Some(session);
                        self.state.forecast_error = None;
                        self.state.loaded_at = Some(Utc::now());
                        if request.origin == FetchOrigin::Selection {
                            self.persist_city(&request.city);
                        }
                    }
                    Err(error) => {
                        tracing::warn!(city = %request.city, %error, "forecast fetch failed");
                        self.state.forecast_error = Some(ForecastFailure { request, error });
                    }
                }
                true
            }
        }
    }

    fn reset_search(&mut self) {
        self.debouncer.cancel();
        self.search_pending = false;
        self.search_generation += 1;
        self.state.query.clear();
        self.state.candidates.clear();
        self.state.search_error = None;
    }

    fn request_forecast(&mut self, request: ForecastRequest) {
        self.forecast_generation += 1;
        self.forecast_pending = true;
        self.state.loading = true;
        self.state.forecast_error = None;

        let generation = self.forecast_generation;
        let forecast = Arc::clone(&self.forecast);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = forecast
                .forecast(&request.city)
                .await
                .map_err(|e| SessionError::forecast(&e));
            let _ = tx.send(SessionEvent::ForecastDidLoad {
                generation,
                request,
                result,
            });
        });
    }

    fn persist_city(&mut self, city: &str) {
        match self.store.set(CITY_KEY, city) {
            Ok(()) => self.state.persist_error = None,
            Err(e) => {
                let error = SessionError::persistence(&e);
                tracing::warn!(%city, %error, "could not remember city");
                self.state.persist_error = Some(error);
            }
        }
    }
}
