pub mod commands;
pub mod error;
pub mod output;

pub use commands::{AgentCommand, ChatCommand, TokenCommand, UserCommand, VaultCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, error_message, format_timestamp};
