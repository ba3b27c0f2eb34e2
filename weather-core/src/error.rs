/// Failures the session controller can observe. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Location search failed: {0}")]
    SearchProvider(String),
    #[error("Forecast request failed: {0}")]
    ForecastProvider(String),
    #[error("Persistence store error: {0}")]
    Persistence(String),
}

impl SessionError {
    pub fn search(err: &anyhow::Error) -> Self {
        Self::SearchProvider(format!("{err:#}"))
    }

    pub fn forecast(err: &anyhow::Error) -> Self {
        Self::ForecastProvider(format!("{err:#}"))
    }

    pub fn persistence(err: &anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}
