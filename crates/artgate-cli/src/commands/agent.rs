use std::collections::HashMap;

use clap::{Parser, Subcommand};
use artgate_server::client::{AgentSession, collect_agent_turn};
use serde_json::json;

use crate::error::{CliError, CliResult};
use crate::output::error_message;

#[derive(Parser)]
pub struct AgentCommand {
    #[clap(subcommand)]
    pub command: AgentSubcommand,
}

#[derive(Subcommand)]
pub enum AgentSubcommand {
    #[clap(about = "Ask the configured agent one question")]
    Ask(AskArgs),
}

#[derive(Parser)]
pub struct AskArgs {
    #[clap(long, default_value = "http://127.0.0.1:3000", help = "Artgate server URL")]
    pub server: String,

    #[clap(long, env = "ARTGATE_TOKEN", help = "Bearer token")]
    pub token: String,

    #[clap(long, help = "Session id from a previous turn")]
    pub session: Option<String>,

    #[clap(long = "param", value_parser = parse_param, help = "Prompt parameter as key=value")]
    pub params: Vec<(String, String)>,

    #[clap(help = "Question to ask")]
    pub question: String,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

impl AskArgs {
    pub fn body(&self) -> serde_json::Value {
        let session = self
            .session
            .as_deref()
            .map_or_else(AgentSession::new, AgentSession::resume);
        let params: HashMap<&str, &str> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let mut body = json!({ "question": self.question, "promptParams": params });
        if !session.current().is_empty() {
            body["sessionId"] = json!(session.current());
        }
        body
    }
}

impl AgentCommand {
    pub async fn execute(&self) -> CliResult<()> {
        let AgentSubcommand::Ask(args) = &self.command;

        let url = format!("{}/api/agent/chat", args.server.trim_end_matches('/'));
        let response = reqwest::Client::new()
            .post(&url)
            .bearer_auth(&args.token)
            .json(&args.body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError(format!("{status}: {}", error_message(&body))));
        }

        let turn = collect_agent_turn(Box::pin(response.bytes_stream())).await?;

        let mut session = args
            .session
            .as_deref()
            .map_or_else(AgentSession::new, AgentSession::resume);
        session.observe(&turn);

        println!("{}", turn.content());
        if !session.current().is_empty() {
            eprintln!("session: {}", session.current());
        }
        Ok(())
    }
}
