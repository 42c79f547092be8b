use starter_kit::{logging, router, AppState, Config, Database};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// How long to drain in-flight requests after a termination signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    logging::init(&config.log);

    let db = Arc::new(Database::connect(&config.postgres).await?);
    let state = AppState::new(Arc::clone(&db));
    let app = router(state);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    tokio::select! {
        result = server => result?,
        () = drain_deadline() => {
            tracing::warn!("grace period elapsed, aborting in-flight requests");
        }
    }

    db.close().await;
    tracing::info!("server exiting");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

/// Resolves one grace period after a termination signal; bounds the drain in
/// the main select.
async fn drain_deadline() {
    shutdown_signal().await;
    tokio::time::sleep(SHUTDOWN_GRACE).await;
}
