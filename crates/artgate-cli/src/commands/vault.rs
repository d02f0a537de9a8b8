use clap::{Parser, Subcommand};
use artgate_server::config::Config;
use artgate_server::vault::Vault;

use crate::error::CliResult;

#[derive(Parser)]
pub struct VaultCommand {
    #[clap(subcommand)]
    pub command: VaultSubcommand,
}

#[derive(Subcommand)]
pub enum VaultSubcommand {
    #[clap(about = "Encrypt a secret with the server key")]
    Encrypt {
        #[clap(help = "Plaintext to encrypt")]
        plaintext: String,
    },

    #[clap(about = "Decrypt a stored blob with the server key")]
    Decrypt {
        #[clap(help = "Base64 blob to decrypt")]
        blob: String,
    },
}

impl VaultCommand {
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let vault = Vault::new(&config.auth.resolve_secret())?;
        println!("{}", self.run(&vault)?);
        Ok(())
    }

    fn run(&self, vault: &Vault) -> CliResult<String> {
        match &self.command {
            VaultSubcommand::Encrypt { plaintext } => Ok(vault.encrypt(plaintext)),
            VaultSubcommand::Decrypt { blob } => Ok(vault.decrypt(blob)?.expose().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(sub: VaultSubcommand) -> VaultCommand {
        VaultCommand { command: sub }
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let vault = Vault::new("cli-secret").unwrap();
        let blob = command(VaultSubcommand::Encrypt {
            plaintext: "sk-abc".to_string(),
        })
        .run(&vault)
        .unwrap();
        let plain = command(VaultSubcommand::Decrypt { blob }).run(&vault).unwrap();
        assert_eq!(plain, "sk-abc");
    }

    #[test]
    fn test_decrypt_garbage_fails() {
        let vault = Vault::new("cli-secret").unwrap();
        let err = command(VaultSubcommand::Decrypt {
            blob: "***".to_string(),
        })
        .run(&vault)
        .unwrap_err();
        assert!(err.to_string().starts_with("Cannot decrypt"));
    }
}
