use std::io::Write;

use clap::Parser;
use artgate_server::client::collect_chat_stream;
use artgate_server::models::ChatMessage;
use serde_json::json;

use crate::error::{CliError, CliResult};
use crate::output::error_message;

#[derive(Parser)]
pub struct ChatCommand {
    #[clap(long, default_value = "http://127.0.0.1:3000", help = "Artgate server URL")]
    pub server: String,

    #[clap(long, env = "ARTGATE_TOKEN", help = "Bearer token")]
    pub token: String,

    #[clap(long, help = "System message sent before the user message")]
    pub system: Option<String>,

    #[clap(help = "Message to send")]
    pub message: String,
}

impl ChatCommand {
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.as_str()));
        }
        messages.push(ChatMessage::user(self.message.as_str()));
        messages
    }

    pub async fn execute(&self) -> CliResult<()> {
        let url = format!("{}/api/ai/chat", self.server.trim_end_matches('/'));
        let response = reqwest::Client::new()
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "messages": self.messages(), "stream": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError(format!("{status}: {}", error_message(&body))));
        }

        let mut stdout = std::io::stdout();
        let reply = collect_chat_stream(Box::pin(response.bytes_stream()), |delta| {
            print!("{delta}");
            let _ = stdout.flush();
        })
        .await?;
        println!();

        if !reply.is_complete {
            eprintln!("(stream ended without [DONE])");
        }
        Ok(())
    }
}
