// crates/server/src/main.rs
//! Peek-a-Boo Boxing tracker server binary.
//!
//! Resolves the data directory, makes sure the database and settings file
//! exist, then serves the API until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use peekaboo_core::paths::AppPaths;
use peekaboo_core::SettingsStore;
use peekaboo_server::{create_app, init_metrics, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 5000;

/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Parser)]
#[command(name = "peekaboo", version, about = "Peek-a-Boo Boxing training tracker")]
struct Cli {
    /// Port to listen on (overrides PEEKABOO_PORT and PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides PEEKABOO_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Directory holding the database, settings and backups
    /// (overrides PEEKABOO_DATA_DIR).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// Port from the CLI, then `PEEKABOO_PORT`, then `PORT`.
fn get_port(cli: &Cli) -> u16 {
    cli.port
        .or_else(|| {
            std::env::var("PEEKABOO_PORT")
                .ok()
                .or_else(|| std::env::var("PORT").ok())
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT)
}

fn get_host(cli: &Cli) -> String {
    cli.host
        .clone()
        .or_else(|| std::env::var("PEEKABOO_HOST").ok())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

fn resolve_paths(cli: &Cli) -> Result<AppPaths> {
    match &cli.data_dir {
        Some(dir) => Ok(AppPaths::new(dir)),
        None => AppPaths::resolve_default()
            .context("could not determine a data directory; pass --data-dir"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    peekaboo_observability::init_tracing();
    init_metrics();

    let paths = resolve_paths(&cli)?;
    paths
        .ensure_dirs()
        .with_context(|| format!("creating {}", paths.data_dir.display()))?;

    let settings = SettingsStore::new(&paths.settings_path);
    if settings
        .ensure_exists()
        .context("writing default settings")?
    {
        tracing::info!(path = %paths.settings_path.display(), "Wrote default settings");
    }

    let state = AppState::open(&paths)
        .await
        .with_context(|| format!("opening database at {}", paths.db_path.display()))?;
    tracing::info!(
        db = %paths.db_path.display(),
        backups = %paths.backup_dir.display(),
        "Database ready"
    );

    let app = create_app(state);

    let host = get_host(&cli);
    let port = get_port(&cli);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
