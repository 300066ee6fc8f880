use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use storyboard_api::config::{DataDirs, ServerConfig};
use storyboard_api::router::build_app_router;
use storyboard_api::state::AppState;
use storyboard_core::import::{CommandAnalyzer, StoryAnalyzer};
use storyboard_pipeline::Orchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // LOG_FORMAT=json switches to one JSON object per line.
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storyboard_api=debug,storyboard_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let dirs = DataDirs::new(&config.data_dir);
    dirs.create_all()
        .await
        .context("Failed to create data directories")?;

    // --- Image backend and generation ---
    let backend = config.backend.build();
    match backend.check_availability().await {
        Ok(()) => tracing::info!(backend = %backend.kind(), "Image backend available"),
        Err(e) => tracing::warn!(backend = %backend.kind(), error = %e, "Image backend not available"),
    }

    // --- Story analyzer (optional) ---
    let analyzer = CommandAnalyzer::from_command_line(&config.analyzer_command, config.analyzer_timeout())
        .map(|a| {
            tracing::info!(program = a.program(), "Story analyzer configured");
            Arc::new(a) as Arc<dyn StoryAnalyzer>
        });

    let orchestrator =
        Orchestrator::new(backend, dirs.outputs.clone()).with_timeout(config.generation_timeout());
    let state = AppState::new(config.clone(), orchestrator, analyzer);

    let app = build_app_router(state, &config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
