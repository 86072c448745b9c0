use anyhow::{Context, Result};
use clap::Parser;
use daily_light::{api, config::Config, devotional::DevotionalService, logging};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

/// Serve devotionals generated from journal entries.
#[derive(Debug, Parser)]
#[command(name = "daily-light", version, about)]
struct Cli {
    /// Interface to bind (overrides `SERVER_HOST`).
    #[arg(long)]
    host: Option<IpAddr>,
    /// Port to bind (overrides `SERVER_PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Env file to load instead of `.env`.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config =
        Config::load(cli.env_file.as_deref()).context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }

    logging::init_tracing(config.run_mode, config.log_file.as_deref());
    if config.run_mode.is_development() {
        config.log_summary();
    }

    let service = Arc::new(DevotionalService::from_config(&config));
    let app = api::create_router(service);

    let addr = SocketAddr::new(config.server_host, config.server_port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
