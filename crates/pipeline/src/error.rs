use printshop_ai::ProviderError;
use printshop_core::error::CoreError;
use printshop_core::imaging::ImageError;
use printshop_core::storage::StorageError;
use printshop_print::{FtpError, PdfError};
use uuid::Uuid;

/// Errors surfaced by the pipeline workflows.
///
/// The HTTP layer maps each variant to a status code; nothing here knows
/// about HTTP.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Ftp(#[from] FtpError),

    /// No active cart, or the active cart has no lines.
    #[error("Cart is empty")]
    CartEmpty,

    /// An order already references the cart.
    #[error("An order already exists for this cart")]
    DuplicateOrder,

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),
}

impl PipelineError {
    pub(crate) fn not_found(entity: &'static str, id: printshop_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(msg.into()))
    }
}
