//! HTTP server wiring for the proxy and config routes

use axum::{
    Json, Router,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::auth::{IdentityResolver, ResolvedPrincipal, TokenService};
use crate::config::Config;
use crate::error::{ArtgateError, Result};
use crate::store::CredentialStore;
use crate::vault::Vault;

use super::agent::agent_chat_handler;
use super::chat::chat_handler;
use super::config_routes::{
    get_agent_config, get_user_config, me_handler, save_agent_config, save_user_config,
};
use super::ProxyError;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Upstream HTTP client, shared so connections are pooled
    pub client: reqwest::Client,
    pub resolver: IdentityResolver,
}

impl AppState {
    /// Build state from config: resolve the server secret, then set up the
    /// vault, token service and upstream client around `store`
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let secret = config.auth.resolve_secret();
        let vault = Vault::new(&secret)?;
        let tokens = TokenService::new(&secret, config.auth.token_ttl_secs);

        // Connect timeout only: a whole-request timeout would cut long streams
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.server.connect_timeout_secs))
            .build()
            .map_err(|e| ArtgateError::Proxy(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            resolver: IdentityResolver::new(tokens, vault, store),
            config,
            client,
        })
    }
}

/// Extractor that resolves the bearer credential or rejects with 401
pub struct Authenticated(pub ResolvedPrincipal);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ProxyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        state
            .resolver
            .resolve(header)
            .await?
            .map(Authenticated)
            .ok_or(ProxyError::Unauthenticated)
    }
}

/// The artgate HTTP server
pub struct ProxyServer {
    state: Arc<AppState>,
}

impl ProxyServer {
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self {
            state: Arc::new(AppState::new(config, store)?),
        })
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let config = &self.state.config;
        let addr: SocketAddr = config
            .server
            .listen_addr
            .parse()
            .map_err(|e| ArtgateError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Chat upstream default: {}", config.upstream.llm_base_url);
        tracing::info!("Agent upstream default: {}", config.upstream.agent_base_url);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ArtgateError::Proxy(format!("Failed to bind to {addr}: {e}")))?;
        tracing::info!("Listening on {addr}");

        axum::serve(listener, create_router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ArtgateError::Proxy(format!("Server error: {e}")))?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/user/config", get(get_user_config).post(save_user_config))
        .route("/api/agent/config", get(get_agent_config).post(save_agent_config))
        .route("/api/ai/chat", post(chat_handler))
        .route("/api/agent/chat", post(agent_chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
