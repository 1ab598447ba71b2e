//! HTTP server lifecycle: bind, serve the API router, drain on shutdown.

use crate::api::{api_router, ApiContext};
use crate::error::Result;

/// Serve the API until Ctrl-C or SIGTERM.
pub async fn serve(ctx: ApiContext) -> Result<()> {
    let addr = ctx.config.bind_addr();
    let environment = ctx.config.environment.clone();
    let allowed_origin = ctx.config.allowed_origin.clone();
    let app = api_router(ctx)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Clinic metrics API listening on {}", listener.local_addr()?);
    log::info!("Environment: {environment}");
    log::info!("CORS allowed origin: {allowed_origin}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Ctrl-C received, shutting down gracefully"),
        _ = terminate => log::info!("SIGTERM received, shutting down gracefully"),
    }
}
