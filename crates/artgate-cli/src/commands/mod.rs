pub mod agent;
pub mod chat;
pub mod token;
pub mod user;
pub mod vault;

pub use agent::AgentCommand;
pub use chat::ChatCommand;
pub use token::TokenCommand;
pub use user::UserCommand;
pub use vault::VaultCommand;

use artgate_server::store::FileStore;
use artgate_server::config::Config;

use crate::error::CliResult;

/// Open the file store the server would use with this config
pub async fn open_store(config: &Config) -> CliResult<FileStore> {
    Ok(FileStore::open(config.storage.store_path()).await?)
}
