//! Per-principal credential management and identity routes

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::server::{AppState, Authenticated};
use super::ProxyError;
use crate::models::{AgentConfig, AgentCredential, LlmConfig, LlmCredential};

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ProxyError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected config body: {e}");
        ProxyError::MalformedRequest("invalid request body".to_string())
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfigView {
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
}

impl From<&LlmConfig> for ApiConfigView {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.as_ref().map(|k| k.expose().to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigView {
    pub app_id: String,
    pub api_key: Option<String>,
    #[serde(rename = "baseURL")]
    pub base_url: String,
}

impl From<&AgentConfig> for AgentConfigView {
    fn from(config: &AgentConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            api_key: config.api_key.as_ref().map(|k| k.expose().to_string()),
            base_url: config.base_url.clone(),
        }
    }
}

fn prompt_view(prompt: Option<&String>) -> Value {
    prompt.map_or(Value::Null, |content| json!({ "content": content }))
}

/// GET /api/auth/me
pub async fn me_handler(Authenticated(principal): Authenticated) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": {
            "id": principal.id,
            "email": principal.email,
            "name": principal.name,
        },
        "apiConfig": principal.llm_config.as_ref().map(ApiConfigView::from),
        "agentConfig": principal.agent_config.as_ref().map(AgentConfigView::from),
        "userPrompt": prompt_view(principal.user_prompt.as_ref()),
    }))
}

/// GET /api/user/config
pub async fn get_user_config(Authenticated(principal): Authenticated) -> Json<Value> {
    Json(json!({
        "success": true,
        "apiConfig": principal.llm_config.as_ref().map(ApiConfigView::from),
        "userPrompt": prompt_view(principal.user_prompt.as_ref()),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfigInput {
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveUserConfigRequest {
    #[serde(default)]
    pub api_config: Option<ApiConfigInput>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// POST /api/user/config
pub async fn save_user_config(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request: SaveUserConfigRequest = parse_body(&body)?;
    let store = state.resolver.store();

    if let Some(input) = request.api_config {
        let defaults = &state.config.upstream;
        let record = LlmCredential {
            base_url: input.base_url.filter(|b| !b.is_empty()),
            model: input
                .model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| defaults.default_model.clone()),
            temperature: input.temperature.unwrap_or(defaults.default_temperature),
            api_key: state
                .resolver
                .vault()
                .encrypt(input.api_key.as_deref().unwrap_or_default()),
        };
        store.upsert_llm_credential(&principal.id, record).await?;
        tracing::info!(user_id = %principal.id, "Saved chat credential");
    }

    if let Some(prompt) = request.user_prompt {
        store.upsert_user_prompt(&principal.id, prompt).await?;
        tracing::info!(user_id = %principal.id, "Saved user prompt");
    }

    Ok(Json(json!({ "success": true, "message": "configuration saved" })))
}

/// GET /api/agent/config
pub async fn get_agent_config(Authenticated(principal): Authenticated) -> Json<Value> {
    Json(json!({
        "success": true,
        "config": principal.agent_config.as_ref().map(AgentConfigView::from),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAgentConfigRequest {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
}

/// POST /api/agent/config
pub async fn save_agent_config(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request: SaveAgentConfigRequest = parse_body(&body)?;
    if request.app_id.is_empty() || request.api_key.is_empty() {
        return Err(ProxyError::MalformedRequest(
            "appId and apiKey are required".to_string(),
        ));
    }

    let record = AgentCredential {
        app_id: request.app_id,
        base_url: request
            .base_url
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| state.config.upstream.agent_base_url.clone()),
        api_key: state.resolver.vault().encrypt(&request.api_key),
    };
    state
        .resolver
        .store()
        .upsert_agent_credential(&principal.id, record)
        .await?;
    tracing::info!(user_id = %principal.id, "Saved agent credential");

    Ok(Json(json!({ "success": true, "message": "agent configuration saved" })))
}
