use crate::types::DbId;

/// Error kinds shared by every layer; the HTTP layer maps each to one status.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `entity` is the aggregate name, e.g. `Article` or `CartItem`.
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: DbId },

    #[error("invalid input: {0}")]
    Validation(String),

    /// A uniqueness or ownership rule would be broken.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not authenticated: {0}")]
    Unauthorized(String),

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("internal: {0}")]
    Internal(String),
}
