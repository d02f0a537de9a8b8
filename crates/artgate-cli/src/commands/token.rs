use clap::{Parser, Subcommand};
use artgate_server::auth::TokenService;
use artgate_server::config::Config;
use artgate_server::store::CredentialStore;

use crate::error::CliResult;

#[derive(Parser)]
pub struct TokenCommand {
    #[clap(subcommand)]
    pub command: TokenSubcommand,
}

#[derive(Subcommand)]
pub enum TokenSubcommand {
    #[clap(about = "Issue a bearer token for a registered principal")]
    Issue {
        #[clap(long, help = "Principal id")]
        user: String,
    },
}

impl TokenCommand {
    pub async fn execute(&self, config: &Config, store: &dyn CredentialStore) -> CliResult<()> {
        match &self.command {
            TokenSubcommand::Issue { user } => {
                if store.find_principal(user).await?.is_none() {
                    return Err(format!("No principal with id '{user}'").into());
                }
                let tokens =
                    TokenService::new(&config.auth.resolve_secret(), config.auth.token_ttl_secs);
                println!("{}", tokens.issue(user)?);
                Ok(())
            }
        }
    }
}
