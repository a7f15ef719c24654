use thiserror::Error;

/// Errors raised while fetching, normalising or delivering market data.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Connection, TLS or timeout failure talking to an upstream.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was JSON but not the shape we expected.
    #[error("malformed payload from {provider}: {reason}")]
    Malformed { provider: &'static str, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Not enough records (or candles) to compute anything meaningful.
    #[error("insufficient data: needed {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl ScanError {
    pub fn malformed(provider: &'static str, reason: impl Into<String>) -> Self {
        ScanError::Malformed { provider, reason: reason.into() }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
