use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::provider::ImageProvider;

/// Placeholder for the Flux service; every call fails as unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct FluxProvider;

#[async_trait]
impl ImageProvider for FluxProvider {
    fn name(&self) -> &'static str {
        "flux"
    }

    async fn edit_single(
        &self,
        _cancel: &CancellationToken,
        _image: &[u8],
        _prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        Err(ProviderError::Unsupported("flux".into()))
    }
}
