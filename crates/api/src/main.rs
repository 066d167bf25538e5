use std::net::SocketAddr;
use std::sync::Arc;

use printshop_ai::ProviderRegistry;
use printshop_core::storage::StorageLayout;
use printshop_db::DbPool;
use printshop_pipeline::generation::GenerationService;
use printshop_print::{PdfDispatcher, SftpUploader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use printshop_api::config::ServerConfig;
use printshop_api::router::build_app_router;
use printshop_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.addr,
        storage_root = %config.storage_root.display(),
        test_mode = config.providers.test_mode,
        default_provider = config.providers.default_provider.as_str(),
        "Loaded server configuration",
    );

    let pool = connect_database(&config.database_url).await;

    let layout = StorageLayout::new(config.storage_root.clone());
    layout
        .ensure_public_dirs()
        .await
        .expect("Failed to create storage directories");

    let registry = Arc::new(ProviderRegistry::new(config.providers.clone()));
    let generation = GenerationService::new(pool.clone(), layout.clone(), registry);
    let pdf_dispatcher = PdfDispatcher::new(Arc::new(SftpUploader));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        layout,
        generation,
        pdf_dispatcher,
    };

    let app = build_app_router(state, &config);

    let addr: SocketAddr = config.addr.parse().expect("ADDR must be a valid socket address");
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printshop_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Pool, reachability check and migrations. Any failure aborts startup.
async fn connect_database(database_url: &str) -> DbPool {
    let pool = printshop_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    printshop_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    printshop_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready, migrations applied");
    pool
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
