//! campuschat CLI and HTTP API entry point.
//!
//! Parses CLI arguments, loads configuration, wires the database and
//! services, then either runs an operator command or starts the server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use clap_complete::generate;

use campuschat_infra::config::load_config;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    campuschat_observe::tracing_setup::init_tracing(cli.log_directive(), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "campuschat", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config).await?;
    let state = AppState::init(&config).await?;

    let result = match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(state, &host, port, config.auth.purge_interval_secs).await
        }
        Commands::RevokeSessions { email } => cli::admin::revoke_sessions(&state, &email).await,
        Commands::PurgeChallenges => cli::admin::purge_challenges(&state).await,
        Commands::Completions { .. } => Ok(()),
    };

    campuschat_observe::tracing_setup::shutdown_tracing();
    result
}

async fn serve(state: AppState, host: &str, port: u16, purge_interval_secs: u64) -> anyhow::Result<()> {
    let purge = spawn_challenge_purge(state.clone(), Duration::from_secs(purge_interval_secs.max(1)));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} campuschat listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, "server started");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    println!("\n  Server stopped.");
    Ok(())
}

/// Periodically delete expired challenges until aborted.
fn spawn_challenge_purge(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = state.verification.purge_expired().await {
                tracing::warn!(error = %e, "challenge purge failed");
            }
        }
    })
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("shutdown signal received");
}
