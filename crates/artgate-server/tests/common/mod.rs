//! Shared fixtures for route-level tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response},
};

use artgate_server::config::Config;
use artgate_server::models::{AgentCredential, LlmCredential, Principal};
use artgate_server::proxy::{AppState, create_router};
use artgate_server::store::{CredentialStore, MemoryStore};

pub const USER_ID: &str = "user-1";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// App with one registered principal and no credentials
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(mut config: Config) -> Self {
        config.auth.secret_env = "ARTGATE_INTEGRATION_UNSET".to_string();
        config.auth.secret = Some("integration-secret".to_string());

        let store = Arc::new(MemoryStore::new());
        store
            .insert_principal(Principal::new(USER_ID, "ada@example.com", "Ada"))
            .await
            .unwrap();

        let shared: Arc<dyn CredentialStore> = store.clone();
        let state = Arc::new(AppState::new(config, shared).unwrap());
        Self { state, store }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn token(&self) -> String {
        self.state.resolver.tokens().issue(USER_ID).unwrap()
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token())
    }

    pub async fn save_llm(&self, base_url: Option<&str>, api_key: &str) {
        let record = LlmCredential {
            base_url: base_url.map(String::from),
            model: "gpt-4o".to_string(),
            temperature: 0.5,
            api_key: self.state.resolver.vault().encrypt(api_key),
        };
        self.store.upsert_llm_credential(USER_ID, record).await.unwrap();
    }

    pub async fn save_agent(&self, base_url: &str, app_id: &str, api_key: &str) {
        let blob = self.state.resolver.vault().encrypt(api_key);
        self.save_agent_blob(base_url, app_id, &blob).await;
    }

    pub async fn save_agent_blob(&self, base_url: &str, app_id: &str, blob: &str) {
        let record = AgentCredential {
            app_id: app_id.to_string(),
            base_url: base_url.to_string(),
            api_key: blob.to_string(),
        };
        self.store.upsert_agent_credential(USER_ID, record).await.unwrap();
    }
}

pub fn post_json(uri: &str, auth: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_raw(uri: &str, auth: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", auth)
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
