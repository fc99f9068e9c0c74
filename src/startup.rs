//! Application startup and server initialization.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::exporter::Exporter;
use crate::routes;
use crate::state::AppState;
use crate::store::MongoStatusSource;

/// How long in-flight scrapes may keep running after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Initializes the exporter and runs the HTTP server until a shutdown
/// signal arrives.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the configured port
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(MongoStatusSource::new(&config.mongodb_uri));
    let exporter = Arc::new(Exporter::new(source));

    // Warm the gauges once at boot. The store frequently comes up after
    // the exporter, so a failure here is logged and startup continues.
    if let Err(e) = exporter.scrape().await {
        warn!("Initial metrics update failed: {}", e);
    }

    let state = AppState {
        config: config.clone(),
        exporter,
    };

    let app = routes::create_router(state);

    let bind_address = config.bind_address();
    info!("Serving metrics on http://{}/metrics", bind_address);

    let listener = TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_with_grace())
        .await?;

    info!("Server exited");
    Ok(())
}

/// Resolves when a shutdown signal arrives, which makes axum stop
/// accepting new scrapes and drain in-flight ones. Draining is bounded:
/// a watchdog forces exit once the grace period elapses.
async fn shutdown_with_grace() {
    shutdown_signal().await;
    info!("Received shutdown signal, draining in-flight scrapes");

    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        warn!("Grace period elapsed, forcing exit");
        std::process::exit(0);
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
