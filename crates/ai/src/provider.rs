//! The provider capability and the closed set of provider kinds.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;

/// A remote (or fake) service that edits one image according to a prompt.
///
/// Implementations produce the images of a single candidate request;
/// fan-out to several candidates is the orchestrator's job.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of candidates requested when the caller asks for `n <= 0`.
    fn default_candidates(&self) -> usize {
        1
    }

    /// Run one candidate request.
    ///
    /// Must return promptly with [`ProviderError::Cancelled`] once `cancel`
    /// fires.
    async fn edit_single(
        &self,
        cancel: &CancellationToken,
        image: &[u8],
        prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError>;
}

/// Provider kinds selectable per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    OpenAiImage,
    Flux,
    Mock,
}

impl Provider {
    /// Parse a provider hint, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" | "openai-image" => Ok(Self::OpenAiImage),
            "flux" => Ok(Self::Flux),
            "mock" => Ok(Self::Mock),
            other => Err(ProviderError::Unsupported(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAiImage => "openai-image",
            Self::Flux => "flux",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
