use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key. Set the appropriate environment variable for your provider.")]
    MissingApiKey,

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited. Try again later.")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl LlmError {
    /// Returns true for failures worth retrying with backoff.
    ///
    /// Rate limits, network hiccups, and 5xx responses are transient;
    /// everything else (bad key, malformed response, 4xx) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited | LlmError::Network(_) => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Network("connection reset".into()).is_transient());
        assert!(LlmError::ApiError {
            status: 503,
            message: "overloaded".into()
        }
        .is_transient());
        assert!(!LlmError::ApiError {
            status: 401,
            message: "unauthorized".into()
        }
        .is_transient());
        assert!(!LlmError::MissingApiKey.is_transient());
        assert!(!LlmError::ParseError("bad json".into()).is_transient());
    }
}
