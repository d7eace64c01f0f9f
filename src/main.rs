use anyhow::Context;
use std::future::IntoFuture;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use socnet::config::AppConfig;
use socnet::server::route_builder::{build_state, register_routes};
use socnet::utils::jwt::JwtService;

async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let jwt_service = JwtService::from_env()?;
    let state = build_state(&config, jwt_service).await?;
    let app = register_routes(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Server started on {}", config.bind_addr);

    let token = CancellationToken::new();
    tokio::spawn(wait_for_signal(token.clone()));

    let shutdown = token.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .into_future();

    let grace = config.shutdown_grace;
    let deadline = async {
        token.cancelled().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.context("server error")?;
            tracing::info!("Server exited properly");
        }
        _ = deadline => {
            tracing::warn!("In-flight requests still running after {:?}, forcing shutdown", grace);
        }
    }

    if tokio::time::timeout(grace, state.close()).await.is_err() {
        tracing::warn!("Connections still busy after {:?}, exiting anyway", grace);
    } else {
        tracing::info!("Connections closed");
    }

    Ok(())
}
