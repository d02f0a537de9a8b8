use std::path::PathBuf;

use clap::{Parser, Subcommand};
use artgate_cli::commands::{
    AgentCommand, ChatCommand, TokenCommand, UserCommand, VaultCommand, open_store,
};
use artgate_cli::error::CliResult;
use artgate_cli::output::OutputFormat;
use artgate_server::config::Config;

#[derive(Parser)]
#[command(name = "artgate-cli")]
#[command(about = "Artgate CLI - operator tool and reference client for the artgate server")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Encrypt or decrypt secrets with the server key")]
    Vault(VaultCommand),

    #[clap(about = "Issue bearer tokens")]
    Token(TokenCommand),

    #[clap(about = "Manage principals in the credential store")]
    User(UserCommand),

    #[clap(about = "Stream a chat completion through the server")]
    Chat(ChatCommand),

    #[clap(about = "Talk to the configured agent through the server")]
    Agent(AgentCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    match &cli.command {
        Command::Chat(cmd) => cmd.execute().await,
        Command::Agent(cmd) => cmd.execute().await,
        Command::Vault(cmd) => {
            let config = Config::load(cli.config.as_deref())?;
            cmd.execute(&config)
        }
        Command::Token(cmd) => {
            let config = Config::load(cli.config.as_deref())?;
            let store = open_store(&config).await?;
            cmd.execute(&config, &store).await
        }
        Command::User(cmd) => {
            let config = Config::load(cli.config.as_deref())?;
            let store = open_store(&config).await?;
            cmd.execute(&store, format).await
        }
    }
}
