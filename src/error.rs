use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarbonpostError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("green check failed: {0}")]
    Resolver(String),

    #[error("history store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl CarbonpostError {
    /// Caller-fault errors: surfaced as 400 and never recorded in history.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CarbonpostError::Validation(_) | CarbonpostError::UnsupportedBackend(_)
        )
    }
}

/// Result type for carbonpost crate
pub type Result<T> = std::result::Result<T, CarbonpostError>;
