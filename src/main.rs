use fr_journal::session::spawn_idle_sweeper;
use fr_journal::{router, AppState, Config};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let backend = config.build_backend().await?;
    info!(backend = ?config.backend, "backend ready");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let session_idle = config.session_idle;
    let state = AppState::new(config, backend);
    spawn_idle_sweeper(Arc::clone(&state.sessions), session_idle);
    let app = router(state);

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
