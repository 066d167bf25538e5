use std::sync::Arc;

use printshop_core::storage::StorageLayout;
use printshop_pipeline::generation::GenerationService;
use printshop_print::PdfDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every member is a pool handle, an `Arc` or a small
/// `Clone` value.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: printshop_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Filesystem layout rooted at `STORAGE_ROOT`.
    pub layout: StorageLayout,
    /// Upload-to-candidates workflow, bound to the provider registry.
    pub generation: GenerationService,
    /// Pushes rendered order PDFs to the print shop.
    pub pdf_dispatcher: PdfDispatcher,
}
