use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::provider::ImageProvider;

/// Echoes the input image back as the single candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProvider;

#[async_trait]
impl ImageProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn edit_single(
        &self,
        cancel: &CancellationToken,
        image: &[u8],
        _prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(vec![image.to_vec()])
    }
}
