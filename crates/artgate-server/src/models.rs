//! Core data types shared by the store, the resolver and the proxies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

/// An authenticated user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Stored OpenAI-compatible chat credential. `api_key` is always the vault blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCredential {
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub api_key: String,
}

/// Stored conversational agent credential. `api_key` is always the vault blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCredential {
    pub app_id: String,
    pub base_url: String,
    pub api_key: String,
}

/// Decrypted chat configuration for one request
///
/// `api_key` is `None` when the stored blob could not be decrypted.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<Secret>,
    pub model: String,
    pub temperature: f64,
}

/// Decrypted agent configuration for one request
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub app_id: String,
    pub base_url: String,
    pub api_key: Option<Secret>,
}

/// Chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of an ordered chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
