//! Eventgate server entry point.

use std::error::Error;
use std::sync::Arc;

use eventgate_api::config::GatewayConfig;
use eventgate_api::routes;
use eventgate_api::state::AppState;
use eventgate_api::telemetry;
use eventgate_core::clock::SystemClock;
use eventgate_core::store::EventStore;
use eventgate_ingest::pipeline::queue::IngestQueue;
use eventgate_ingest::pipeline::worker::WorkerPool;
use eventgate_store::connection::connect_with_retry;
use eventgate_store::pg_event_store::PgEventStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let telemetry = telemetry::init("eventgate")?;

    tracing::info!("Starting eventgate");

    let config = GatewayConfig::from_env()?;
    let addr = config.bind_addr()?;

    let pool = connect_with_retry(&config.database_url, &config.connect).await?;
    let store = Arc::new(PgEventStore::new(pool));
    store.migrate().await?;
    tracing::info!("database schema is up to date");

    let queue = Arc::new(IngestQueue::new());
    let store_handle: Arc<dyn EventStore> = store.clone();
    let workers = WorkerPool::spawn(
        config.workers,
        Arc::clone(&queue),
        Arc::clone(&store_handle),
        config.retry,
    )?;

    let app_state = AppState::new(
        Arc::new(SystemClock),
        store_handle,
        queue,
        workers.monitor(),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(mode = ?config.shutdown_mode, "stopping worker pool");
    workers.shutdown(config.shutdown_mode).await;

    store.close().await;
    tracing::info!("eventgate stopped");
    telemetry.shutdown();

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
