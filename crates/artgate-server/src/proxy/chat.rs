//! `POST /api/ai/chat`: OpenAI-compatible chat proxy

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::Response,
};
use serde::Deserialize;

use super::relay::event_stream_response;
use super::server::{AppState, Authenticated};
use super::upstream::{ChatUpstream, upstream_failure};
use super::ProxyError;
use crate::models::ChatMessage;

fn default_stream() -> bool {
    true
}

/// Body accepted from the client
#[derive(Debug, Deserialize)]
pub struct ChatProxyRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let llm = principal
        .llm_config
        .as_ref()
        .ok_or_else(|| ProxyError::Unconfigured("AI API not configured".to_string()))?;
    let upstream = ChatUpstream::from_config(llm, &state.config.upstream)?;

    let request: ChatProxyRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected chat body: {e}");
        ProxyError::MalformedRequest("invalid message format".to_string())
    })?;

    tracing::info!(
        user_id = %principal.id,
        messages = request.messages.len(),
        stream = request.stream,
        "Chat request"
    );

    let response = upstream
        .send(&state.client, &request.messages, request.stream)
        .await?;

    if !response.status().is_success() {
        return Err(upstream_failure(response, "AI API error").await);
    }

    if request.stream {
        return event_stream_response(response, "chat");
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProxyError::transport(&e))?;
    if serde_json::from_slice::<serde::de::IgnoredAny>(&bytes).is_err() {
        return Err(ProxyError::Internal(
            "upstream returned a non-JSON completion".to_string(),
        ));
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {e}")))
}
