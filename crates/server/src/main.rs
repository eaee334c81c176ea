mod api;
mod cli;
mod error;
mod pipeline;
mod router;
mod state;
mod upload;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command};

fn load_config() -> quickprep_core::Config {
    quickprep_core::config::load_dotenv();
    quickprep_core::Config::from_env()
}

async fn serve(mut config: quickprep_core::Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.log_summary();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(state::AppState::from_config(config)?);
    info!(
        provider = %state.llm_provider,
        default_mode = ?state.default_mode,
        "Pipeline ready"
    );
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config();

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => serve(config, host, port).await?,
        Command::Sections { file } => cli::sections(&config, &file)?,
        Command::Summarize { file, points } => cli::summarize(&config, &file, points).await?,
        Command::Mcq { file } => cli::mcq(&config, &file).await?,
    }

    Ok(())
}
