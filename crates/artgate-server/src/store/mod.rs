//! Per-principal credential storage
//!
//! The proxies only ever read from the store at request start. Writes are
//! whole-record upserts keyed by principal id; concurrent saves for the same
//! principal resolve last-write-wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AgentCredential, LlmCredential, Principal};

/// Storage collaborator for principals and their encrypted credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_principal(&self, id: &str) -> Result<Option<Principal>>;

    /// Register a new principal. Fails if the id is already taken.
    async fn insert_principal(&self, principal: Principal) -> Result<()>;

    async fn list_principals(&self) -> Result<Vec<Principal>>;

    async fn llm_credential(&self, user_id: &str) -> Result<Option<LlmCredential>>;

    /// Create or replace the chat credential of a known principal
    async fn upsert_llm_credential(&self, user_id: &str, record: LlmCredential) -> Result<()>;

    async fn agent_credential(&self, user_id: &str) -> Result<Option<AgentCredential>>;

    /// Create or replace the agent credential of a known principal
    async fn upsert_agent_credential(&self, user_id: &str, record: AgentCredential)
    -> Result<()>;

    async fn user_prompt(&self, user_id: &str) -> Result<Option<String>>;

    async fn upsert_user_prompt(&self, user_id: &str, content: String) -> Result<()>;
}

/// Serializable image of the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub principals: BTreeMap<String, Principal>,
    #[serde(default)]
    pub llm_credentials: BTreeMap<String, LlmCredential>,
    #[serde(default)]
    pub agent_credentials: BTreeMap<String, AgentCredential>,
    #[serde(default)]
    pub user_prompts: BTreeMap<String, String>,
}
