//! threads-web - Compose and publish Threads posts from the browser

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use libthreadcast::logging::LoggingConfig;
use libthreadcast::{AuthContext, Config, ThreadcastService};
use threads_web::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::from_env().init();

    let config = Config::load().context("Failed to load configuration")?;
    let service = ThreadcastService::from_config(&config)?;
    let auth = AuthContext::from_config(&config.auth);
    if !auth.has_bootstrap() {
        tracing::warn!("No initial access token and user id configured; every page will ask to sign in");
    }

    let state = Arc::new(AppState::new(service, auth));
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("threads-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
