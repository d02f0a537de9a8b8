//! Artgate daemon - streaming proxy for chat and agent APIs

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use artgate_server::config::Config;
use artgate_server::error::Result;
use artgate_server::proxy::ProxyServer;
use artgate_server::store::FileStore;

/// Artgate - keeps upstream API keys server-side and streams replies through
#[derive(Parser)]
#[command(name = "artgate")]
#[command(about = "Credential-holding streaming proxy for chat and agent APIs")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,artgate_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting artgate");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!(
        "Config loaded: server={:?} upstream={:?}",
        config.server,
        config.upstream
    );

    let store_path = config.storage.store_path();
    tracing::info!("Opening credential store at: {}", store_path.display());
    let store = FileStore::open(&store_path).await?;

    let server = ProxyServer::new(config, Arc::new(store))?;
    server.serve().await?;

    tracing::info!("Artgate stopped");
    Ok(())
}
