use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Prefix attached to every error surfaced by a single-shot completion.
pub const COMPLETION_ERROR_PREFIX: &str = "OpenAI completion error";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        /// Server hint for how long to wait before trying again
        retry_after: Option<Duration>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("{prefix}: {message}", prefix = COMPLETION_ERROR_PREFIX)]
    Completion {
        message: String,
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// Wrap an error raised while serving a single-shot completion.
    ///
    /// The original error's message is kept verbatim and the error itself
    /// stays reachable through [`std::error::Error::source`].
    pub fn completion(source: LlmError) -> Self {
        LlmError::Completion {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Api { status_code, .. } => *status_code,
            LlmError::Completion { source, .. } => source.status_code(),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}
