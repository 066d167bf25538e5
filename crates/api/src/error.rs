use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use printshop_ai::ProviderError;
use printshop_core::error::CoreError;
use printshop_core::imaging::ImageError;
use printshop_core::storage::StorageError;
use printshop_pipeline::PipelineError;
use printshop_print::FtpError;
use serde_json::json;

const ORDER_CART_CONSTRAINT: &str = "uq_orders_cart_id";

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors and adds HTTP-specific variants. Every variant
/// renders as `{"detail": ..., "code": ...}`; safety blocks add `"reason"`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Pipeline(PipelineError::Storage(err))
    }
}

/// Status, code, detail and optional reason of an error response.
struct Mapped {
    status: StatusCode,
    code: &'static str,
    detail: String,
    reason: Option<String>,
}

impl Mapped {
    fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
            reason: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mapped = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Pipeline(err) => classify_pipeline_error(err),
            AppError::BadRequest(msg) => {
                Mapped::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Mapped::internal()
            }
        };

        let mut body = json!({
            "detail": mapped.detail,
            "code": mapped.code,
        });
        if let Some(reason) = mapped.reason {
            body["reason"] = json!(reason);
        }

        (mapped.status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> Mapped {
    match err {
        CoreError::NotFound { entity, id } => Mapped::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Mapped::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::Conflict(msg) => Mapped::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            Mapped::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => Mapped::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            Mapped::internal()
        }
    }
}

fn classify_pipeline_error(err: &PipelineError) -> Mapped {
    match err {
        PipelineError::Core(core) => classify_core_error(core),
        PipelineError::Database(db) => classify_sqlx_error(db),
        PipelineError::Storage(storage) => classify_storage_error(storage),
        PipelineError::Image(ImageError::UnsupportedOrCorrupt(msg)) => {
            Mapped::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        PipelineError::Image(other) => {
            tracing::error!(error = %other, "Image processing failed");
            Mapped::internal()
        }
        PipelineError::Provider(provider) => classify_provider_error(provider),
        PipelineError::Pdf(pdf) => {
            tracing::error!(error = %pdf, "PDF rendering failed");
            Mapped::internal()
        }
        PipelineError::Ftp(FtpError::ConfigMissing(field)) => {
            tracing::error!(field = %field, "Order PDF SFTP configuration missing");
            Mapped::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "FTP_CONFIG_MISSING",
                "Order PDF upload is not configured",
            )
        }
        PipelineError::Ftp(upload) => {
            tracing::error!(error = %upload, "Order PDF upload failed");
            Mapped::new(
                StatusCode::BAD_GATEWAY,
                "FTP_UPLOAD_FAILED",
                "Failed to upload order PDF",
            )
        }
        PipelineError::CartEmpty => {
            Mapped::new(StatusCode::BAD_REQUEST, "CART_EMPTY", "cart-empty")
        }
        PipelineError::DuplicateOrder => {
            Mapped::new(StatusCode::BAD_REQUEST, "DUPLICATE_ORDER", "duplicate-order")
        }
        PipelineError::OrderNotFound(id) => Mapped::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Order with id {id} not found"),
        ),
    }
}

/// Safety blocks are checked before the generic provider failure.
fn classify_provider_error(err: &ProviderError) -> Mapped {
    match err {
        ProviderError::SafetyBlocked { reason } => Mapped {
            reason: Some(reason.clone()),
            ..Mapped::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "SAFETY_BLOCKED",
                "Request blocked by AI safety filters",
            )
        },
        other => {
            tracing::error!(error = %other, "Image provider failed");
            Mapped::new(
                StatusCode::BAD_GATEWAY,
                "PROVIDER_FAILURE",
                "Image generation failed",
            )
        }
    }
}

fn classify_storage_error(err: &StorageError) -> Mapped {
    match err {
        StorageError::InvalidFilename(name) => Mapped::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Invalid filename: {name}"),
        ),
        StorageError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Mapped::new(StatusCode::NOT_FOUND, "NOT_FOUND", "File not found")
        }
        other => {
            tracing::error!(error = %other, "Storage error");
            Mapped::internal()
        }
    }
}

/// Classify a sqlx error into a response.
///
/// - `RowNotFound` maps to 404.
/// - A unique violation on `uq_orders_cart_id` is a duplicate order (400).
/// - Other unique violations on a `uq_`-prefixed constraint map to 409.
/// - Check violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Mapped {
    match err {
        sqlx::Error::RowNotFound => {
            Mapped::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some("23505") if constraint == ORDER_CART_CONSTRAINT => {
                    return Mapped::new(
                        StatusCode::BAD_REQUEST,
                        "DUPLICATE_ORDER",
                        "duplicate-order",
                    );
                }
                Some("23505") if constraint.starts_with("uq_") => {
                    return Mapped::new(
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
                Some("23514") => {
                    return Mapped::new(
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        format!("Value violates check constraint: {constraint}"),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            Mapped::internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Mapped::internal()
        }
    }
}
