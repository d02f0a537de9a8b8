//! Upstream call descriptions
//!
//! Each proxied request builds one of these from the caller's resolved
//! credentials. Nothing here is shared between requests.

use std::collections::HashMap;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use url::Url;

use super::ProxyError;
use crate::config::UpstreamConfig;
use crate::models::{AgentConfig, ChatMessage, LlmConfig};
use crate::vault::Secret;

/// Join a user-supplied base URL with a path, without normalising either
fn join(base: &str, path: &str) -> Result<Url, ProxyError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&joined)
        .map_err(|e| ProxyError::Unconfigured(format!("invalid base URL '{base}': {e}")))
}

/// Turn a non-success upstream response into a passthrough error
pub async fn upstream_failure(response: reqwest::Response, prefix: &str) -> ProxyError {
    let status = response.status();
    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(status = %status, "Failed to read upstream error body: {e}");
            String::new()
        }
    };
    ProxyError::upstream(status, prefix, &body)
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    stream: bool,
}

/// One call to an OpenAI-compatible `/v1/chat/completions` endpoint
#[derive(Debug)]
pub struct ChatUpstream {
    pub url: Url,
    pub model: String,
    pub temperature: f64,
    api_key: Secret,
}

impl ChatUpstream {
    pub const PATH: &'static str = "/v1/chat/completions";

    /// Build from a principal's chat config, falling back to server
    /// defaults for the base URL and model
    pub fn from_config(config: &LlmConfig, defaults: &UpstreamConfig) -> Result<Self, ProxyError> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .cloned()
            .ok_or_else(|| ProxyError::Unconfigured("API key not configured".to_string()))?;

        let base = config
            .base_url
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(&defaults.llm_base_url);

        let model = if config.model.is_empty() {
            defaults.default_model.clone()
        } else {
            config.model.clone()
        };

        Ok(Self {
            url: join(base, Self::PATH)?,
            model,
            temperature: config.temperature,
            api_key,
        })
    }

    pub async fn send(
        &self,
        client: &reqwest::Client,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, ProxyError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream,
        };

        tracing::debug!(
            url = %self.url,
            model = %self.model,
            messages = messages.len(),
            stream,
            "Forwarding chat completion"
        );

        client
            .post(self.url.clone())
            .bearer_auth(self.api_key.expose())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProxyError::transport(&e))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentCompletionBody<'a> {
    question: &'a str,
    /// Empty string starts a new conversation
    session_id: &'a str,
    prompt_params: &'a HashMap<String, String>,
    incremental_output: bool,
}

/// One call to the agent vendor's completion endpoint
#[derive(Debug)]
pub struct AgentUpstream {
    pub url: Url,
    api_key: Secret,
}

impl AgentUpstream {
    pub fn from_config(config: &AgentConfig) -> Result<Self, ProxyError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProxyError::Decryption(crate::vault::DecryptionError::InvalidEncoding)
        })?;
        let path = format!("/apps/{}/api/v1/completion", config.app_id);

        Ok(Self {
            url: join(&config.base_url, &path)?,
            api_key,
        })
    }

    pub async fn send(
        &self,
        client: &reqwest::Client,
        question: &str,
        session_id: Option<&str>,
        prompt_params: &HashMap<String, String>,
    ) -> Result<reqwest::Response, ProxyError> {
        let body = AgentCompletionBody {
            question,
            session_id: session_id.unwrap_or_default(),
            prompt_params,
            incremental_output: true,
        };

        tracing::debug!(
            url = %self.url,
            resumed = session_id.is_some(),
            "Forwarding agent question"
        );

        // The vendor expects the raw key, not a bearer scheme
        client
            .post(self.url.clone())
            .header(AUTHORIZATION, self.api_key.expose())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProxyError::transport(&e))
    }
}
