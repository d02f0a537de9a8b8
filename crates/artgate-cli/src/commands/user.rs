use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use artgate_server::models::Principal;
use artgate_server::store::CredentialStore;
use uuid::Uuid;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp};

#[derive(Parser)]
pub struct UserCommand {
    #[clap(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand)]
pub enum UserSubcommand {
    #[clap(about = "Register a principal")]
    Add(AddArgs),

    #[clap(about = "List registered principals")]
    List,
}

#[derive(Parser)]
pub struct AddArgs {
    #[clap(long, help = "Email address (unique)")]
    pub email: String,

    #[clap(long, help = "Display name")]
    pub name: String,

    #[clap(long, help = "Principal id (random UUID if omitted)")]
    pub id: Option<String>,
}

impl UserCommand {
    pub async fn execute(&self, store: &dyn CredentialStore, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            UserSubcommand::Add(args) => {
                let principal = add_user(store, args).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&principal)?);
                    }
                    OutputFormat::Table => {
                        println!("Added principal {} <{}>", principal.id, principal.email);
                    }
                }
                Ok(())
            }
            UserSubcommand::List => {
                let principals = store.list_principals().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&principals)?);
                    }
                    OutputFormat::Table => {
                        if principals.is_empty() {
                            println!("No principals registered.");
                        } else {
                            println!("{}", principal_table(&principals));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

async fn add_user(store: &dyn CredentialStore, args: &AddArgs) -> CliResult<Principal> {
    if args.email.trim().is_empty() {
        return Err("Email must not be empty".into());
    }
    let id = args
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let principal = Principal::new(id, args.email.trim(), args.name.as_str());
    store.insert_principal(principal.clone()).await?;
    Ok(principal)
}

fn principal_table(principals: &[Principal]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Email", "Name", "Created"]);

    for p in principals {
        table.add_row(vec![
            p.id.clone(),
            p.email.clone(),
            p.name.clone(),
            format_timestamp(&p.created_at),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use artgate_server::store::FileStore;

    fn args(email: &str, id: Option<&str>) -> AddArgs {
        AddArgs {
            email: email.to_string(),
            name: "Test".to_string(),
            id: id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_add_persists_to_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        let added = add_user(&store, &args("a@example.com", Some("u-a"))).await.unwrap();
        assert_eq!(added.id, "u-a");

        let reopened = FileStore::open(&path).await.unwrap();
        let listed = reopened.list_principals().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn test_add_generates_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();
        let added = add_user(&store, &args("b@example.com", None)).await.unwrap();
        assert!(Uuid::parse_str(&added.id).is_ok());
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates_and_blank_email() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();
        add_user(&store, &args("c@example.com", Some("u-c"))).await.unwrap();

        assert!(add_user(&store, &args("c@example.com", Some("u-d"))).await.is_err());
        assert!(add_user(&store, &args("  ", None)).await.is_err());
    }

    #[test]
    fn test_table_lists_every_principal() {
        let principals = vec![
            Principal::new("u1", "one@example.com", "One"),
            Principal::new("u2", "two@example.com", "Two"),
        ];
        let rendered = principal_table(&principals).to_string();
        assert!(rendered.contains("one@example.com"));
        assert!(rendered.contains("two@example.com"));
    }
}
