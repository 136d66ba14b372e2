use thiserror::Error;

pub type Result<T> = std::result::Result<T, InsightError>;

/// Failure of a structured-completion call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The model answered, but not with JSON matching the requested schema.
    #[error("Invalid structured response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Failed to serialize condensed tree: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model returned `null` instead of an insights object.
    #[error("Unexpected analysis result for {path}: no insights returned")]
    UnexpectedAnalysis { path: String },
}
