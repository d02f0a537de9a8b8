use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{CredentialStore, StoreSnapshot};
use crate::error::{ArtgateError, Result};
use crate::models::{AgentCredential, LlmCredential, Principal};

/// In-process store backed by concurrent maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    principals: DashMap<String, Principal>,
    llm_credentials: DashMap<String, LlmCredential>,
    agent_credentials: DashMap<String, AgentCredential>,
    user_prompts: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            principals: snapshot.principals.into_iter().collect(),
            llm_credentials: snapshot.llm_credentials.into_iter().collect(),
            agent_credentials: snapshot.agent_credentials.into_iter().collect(),
            user_prompts: snapshot.user_prompts.into_iter().collect(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            principals: clone_entries(&self.principals),
            llm_credentials: clone_entries(&self.llm_credentials),
            agent_credentials: clone_entries(&self.agent_credentials),
            user_prompts: clone_entries(&self.user_prompts),
        }
    }

    fn ensure_principal(&self, user_id: &str) -> Result<()> {
        if self.principals.contains_key(user_id) {
            Ok(())
        } else {
            Err(ArtgateError::Storage(format!("Unknown principal: {user_id}")))
        }
    }

    /// Register a principal, rejecting a taken id or email
    pub fn put_principal(&self, principal: Principal) -> Result<()> {
        if self
            .principals
            .iter()
            .any(|p| p.email.eq_ignore_ascii_case(&principal.email))
        {
            return Err(ArtgateError::Storage(format!(
                "Email already registered: {}",
                principal.email
            )));
        }
        match self.principals.entry(principal.id.clone()) {
            Entry::Occupied(_) => Err(ArtgateError::Storage(format!(
                "Principal already exists: {}",
                principal.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(principal);
                Ok(())
            }
        }
    }

    pub fn put_llm_credential(&self, user_id: &str, record: LlmCredential) -> Result<()> {
        self.ensure_principal(user_id)?;
        self.llm_credentials.insert(user_id.to_string(), record);
        Ok(())
    }

    pub fn put_agent_credential(&self, user_id: &str, record: AgentCredential) -> Result<()> {
        self.ensure_principal(user_id)?;
        self.agent_credentials.insert(user_id.to_string(), record);
        Ok(())
    }

    pub fn put_user_prompt(&self, user_id: &str, content: String) -> Result<()> {
        self.ensure_principal(user_id)?;
        self.user_prompts.insert(user_id.to_string(), content);
        Ok(())
    }
}

fn clone_entries<V: Clone>(map: &DashMap<String, V>) -> std::collections::BTreeMap<String, V> {
    map.iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_principal(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.principals.get(id).map(|p| p.value().clone()))
    }

    async fn insert_principal(&self, principal: Principal) -> Result<()> {
        self.put_principal(principal)
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let mut principals: Vec<Principal> =
            self.principals.iter().map(|p| p.value().clone()).collect();
        principals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(principals)
    }

    async fn llm_credential(&self, user_id: &str) -> Result<Option<LlmCredential>> {
        Ok(self.llm_credentials.get(user_id).map(|c| c.value().clone()))
    }

    async fn upsert_llm_credential(&self, user_id: &str, record: LlmCredential) -> Result<()> {
        self.put_llm_credential(user_id, record)
    }

    async fn agent_credential(&self, user_id: &str) -> Result<Option<AgentCredential>> {
        Ok(self.agent_credentials.get(user_id).map(|c| c.value().clone()))
    }

    async fn upsert_agent_credential(
        &self,
        user_id: &str,
        record: AgentCredential,
    ) -> Result<()> {
        self.put_agent_credential(user_id, record)
    }

    async fn user_prompt(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.user_prompts.get(user_id).map(|p| p.value().clone()))
    }

    async fn upsert_user_prompt(&self, user_id: &str, content: String) -> Result<()> {
        self.put_user_prompt(user_id, content)
    }
}
