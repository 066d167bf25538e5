use std::time::Duration;

use printshop_core::imaging::ImageError;

/// Errors from a generative image provider or the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the request for policy reasons.
    #[error("Request blocked by AI safety filters: {reason}")]
    SafetyBlocked { reason: String },

    /// The provider answered but produced no image.
    #[error("Provider returned no images")]
    EmptyResponse,

    #[error("Provider '{0}' is not supported")]
    Unsupported(String),

    /// A required credential is absent from the configuration.
    #[error("Provider is not configured: {0} is not set")]
    NotConfigured(&'static str),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// A spawned generation task panicked or was aborted.
    #[error("Generation task failed: {0}")]
    Task(String),
}

impl ProviderError {
    pub fn is_safety_blocked(&self) -> bool {
        matches!(self, Self::SafetyBlocked { .. })
    }
}
