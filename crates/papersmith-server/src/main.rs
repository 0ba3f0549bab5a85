use papersmith_server::{AppState, config::Settings, create_router, error::Result};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "papersmith_server=debug,papersmith_registry=debug,tower_http=debug".to_string()
        }))
        .init();

    let settings = Settings::load()?;
    info!(
        storage = ?settings.storage.kind,
        cache_capacity = settings.cache.max_capacity,
        cache_ttl_seconds = settings.cache.ttl_seconds,
        "Starting Papersmith Server"
    );

    let state = AppState::from_settings(&settings).await?;
    let app = create_router(state, settings.server.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_address()).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
