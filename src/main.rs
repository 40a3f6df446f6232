//! Cemetery booking HTTP server.

use pusara::auth::{MemorySessionStore, SessionStore};
use pusara::server::{build_router, AppState};
use pusara::storage::{MemoryObjectStorage, ObjectStorage};
use pusara::store::{CemeteryStore, PostgresStore};
use pusara::Config;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pusara=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cemetery booking server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let store = PostgresStore::connect(&config.database).await?;
    store.migrate().await?;
    info!("Database connected and migrated");

    let store: Arc<dyn CemeteryStore> = Arc::new(store);
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let storage: Arc<dyn ObjectStorage> = Arc::new(MemoryObjectStorage::new());
    let state = AppState::new(store, sessions, storage, config.booking.clone());

    let router = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
