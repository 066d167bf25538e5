//! Resolves a provider hint to a concrete [`ImageProvider`].
//!
//! When test mode is on, every hint resolves to the mock provider.

use std::sync::Arc;

use crate::error::ProviderError;
use crate::flux::FluxProvider;
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::mock::MockProvider;
use crate::openai::{OpenAiImageClient, OpenAiImageConfig};
use crate::provider::{ImageProvider, Provider};

/// Provider configuration, usually loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub test_mode: bool,
    pub default_provider: Provider,
    pub gemini: Option<GeminiConfig>,
    pub openai: Option<OpenAiImageConfig>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            test_mode: false,
            default_provider: Provider::Gemini,
            gemini: None,
            openai: None,
        }
    }
}

pub struct ProviderRegistry {
    test_mode: bool,
    default_provider: Provider,
    gemini: Option<Arc<GeminiClient>>,
    openai: Option<Arc<OpenAiImageClient>>,
    fixed: Option<Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            test_mode: settings.test_mode,
            default_provider: settings.default_provider,
            gemini: settings.gemini.map(|c| Arc::new(GeminiClient::new(c))),
            openai: settings.openai.map(|c| Arc::new(OpenAiImageClient::new(c))),
            fixed: None,
        }
    }

    /// A registry that hands out `provider` for every hint.
    pub fn fixed(provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            test_mode: false,
            default_provider: Provider::Mock,
            gemini: None,
            openai: None,
            fixed: Some(provider),
        }
    }

    /// The provider kind a hint selects, before test-mode override.
    pub fn select(&self, hint: Option<&str>) -> Result<Provider, ProviderError> {
        if self.test_mode {
            return Ok(Provider::Mock);
        }
        match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hint) => Provider::parse(hint),
            None => Ok(self.default_provider),
        }
    }

    pub fn resolve(&self, hint: Option<&str>) -> Result<Arc<dyn ImageProvider>, ProviderError> {
        if let Some(fixed) = &self.fixed {
            return Ok(Arc::clone(fixed));
        }
        let provider: Arc<dyn ImageProvider> = match self.select(hint)? {
            Provider::Mock => Arc::new(MockProvider),
            Provider::Flux => Arc::new(FluxProvider),
            Provider::Gemini => self
                .gemini
                .clone()
                .ok_or(ProviderError::NotConfigured("GOOGLE_API_KEY"))?,
            Provider::OpenAiImage => self
                .openai
                .clone()
                .ok_or(ProviderError::NotConfigured("OPENAI_API_KEY"))?,
        };
        Ok(provider)
    }
}
