//! `POST /api/agent/chat`: stateful agent proxy
//!
//! The server keeps no conversation state. The client threads the
//! `sessionId` it last saw in the agent's stream back on the next turn.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response};
use serde::Deserialize;

use super::relay::event_stream_response;
use super::server::{AppState, Authenticated};
use super::upstream::{AgentUpstream, upstream_failure};
use super::ProxyError;

/// Body accepted from the client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub prompt_params: Option<HashMap<String, String>>,
}

pub async fn agent_chat_handler(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let agent = principal
        .agent_config
        .as_ref()
        .ok_or_else(|| ProxyError::Unconfigured("configure the agent first".to_string()))?;
    let upstream = AgentUpstream::from_config(agent)?;

    let request: AgentChatRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected agent body: {e}");
        ProxyError::MalformedRequest("invalid request body".to_string())
    })?;
    if request.question.is_empty() {
        return Err(ProxyError::MalformedRequest(
            "question must not be empty".to_string(),
        ));
    }

    // An empty session id means "start fresh", same as none
    let session_id = request.session_id.as_deref().filter(|s| !s.is_empty());
    let prompt_params = request.prompt_params.unwrap_or_default();

    tracing::info!(
        user_id = %principal.id,
        app_id = %agent.app_id,
        session_id = session_id.unwrap_or("-"),
        "Agent request"
    );

    let response = upstream
        .send(&state.client, &request.question, session_id, &prompt_params)
        .await?;

    if !response.status().is_success() {
        return Err(upstream_failure(response, "agent call failed").await);
    }

    event_stream_response(response, "agent")
}
