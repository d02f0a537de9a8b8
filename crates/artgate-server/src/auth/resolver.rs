//! Resolves an `Authorization` header to a principal and its decrypted configs
//!
//! This is the only authorization gate in front of the proxies. Decryption
//! failures are lenient here: an unreadable secret leaves that config's
//! `api_key` empty rather than failing resolution.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{AgentConfig, LlmConfig};
use crate::store::CredentialStore;
use crate::vault::Vault;

use super::TokenService;

/// Principal plus the per-service configuration visible to its own requests
#[derive(Debug, Clone)]
pub struct ResolvedPrincipal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub llm_config: Option<LlmConfig>,
    pub agent_config: Option<AgentConfig>,
    pub user_prompt: Option<String>,
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Clone)]
pub struct IdentityResolver {
    tokens: TokenService,
    vault: Vault,
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(tokens: TokenService, vault: Vault, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            tokens,
            vault,
            store,
        }
    }

    /// Resolve a raw header value.
    ///
    /// Returns `Ok(None)` for a missing, malformed, forged or expired
    /// credential, and for tokens naming a principal that no longer exists.
    /// Store failures are propagated.
    pub async fn resolve(&self, header: Option<&str>) -> Result<Option<ResolvedPrincipal>> {
        let Some(token) = header.and_then(bearer_token) else {
            tracing::debug!("Missing or malformed Authorization header");
            return Ok(None);
        };

        let Some(claims) = self.tokens.verify(token) else {
            tracing::debug!("Bearer token failed verification");
            return Ok(None);
        };

        let Some(principal) = self.store.find_principal(&claims.user_id).await? else {
            tracing::warn!(user_id = %claims.user_id, "Token names an unknown principal");
            return Ok(None);
        };

        let llm_config = self
            .store
            .llm_credential(&principal.id)
            .await?
            .map(|record| LlmConfig {
                api_key: self.decrypt_lenient(&principal.id, "llm", &record.api_key),
                base_url: record.base_url,
                model: record.model,
                temperature: record.temperature,
            });

        let agent_config = self
            .store
            .agent_credential(&principal.id)
            .await?
            .map(|record| AgentConfig {
                api_key: self.decrypt_lenient(&principal.id, "agent", &record.api_key),
                app_id: record.app_id,
                base_url: record.base_url,
            });

        let user_prompt = self.store.user_prompt(&principal.id).await?;

        Ok(Some(ResolvedPrincipal {
            id: principal.id,
            email: principal.email,
            name: principal.name,
            llm_config,
            agent_config,
            user_prompt,
        }))
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn decrypt_lenient(
        &self,
        user_id: &str,
        service: &str,
        blob: &str,
    ) -> Option<crate::vault::Secret> {
        match self.vault.decrypt(blob) {
            Ok(secret) => Some(secret),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    service = service,
                    blob_len = blob.len(),
                    "Stored secret unreadable: {e}"
                );
                None
            }
        }
    }
}
