use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex as TokioMutex, RwLock};

use super::{CredentialStore, MemoryStore, StoreSnapshot};
use crate::error::{ArtgateError, Result};
use crate::models::{AgentCredential, LlmCredential, Principal};

/// JSON-file backed store
///
/// Reads are served from an in-memory cache. A write re-reads the file under
/// the write lock, applies the change to that fresh copy, and replaces the file
/// through a sibling temp file. The cache only moves to the new state once the
/// rename succeeds, so a failed write leaves both file and cache as they were.
///
/// Records written by another handle on the same file (the CLI, for one) are
/// merged rather than overwritten. There is no cross-process file lock, so two
/// processes committing in the same instant can still race.
#[derive(Debug)]
pub struct FileStore {
    cache: RwLock<Arc<MemoryStore>>,
    path: PathBuf,
    write_lock: TokioMutex<()>,
}

async fn read_snapshot(path: &Path) -> Result<StoreSnapshot> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice::<StoreSnapshot>(&bytes).map_err(|e| {
            ArtgateError::Storage(format!(
                "Failed to parse store file {}: {}",
                path.display(),
                e
            ))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No store file at {}, starting empty", path.display());
            Ok(StoreSnapshot::default())
        }
        Err(e) => Err(ArtgateError::Storage(format!(
            "Failed to read store file {}: {}",
            path.display(),
            e
        ))),
    }
}

async fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await.map_err(|e| {
        ArtgateError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        ArtgateError::Storage(format!("Failed to replace {}: {}", path.display(), e))
    })
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = read_snapshot(&path).await?;

        tracing::debug!(
            principals = snapshot.principals.len(),
            "Loaded credential store from {}",
            path.display()
        );

        Ok(Self {
            cache: RwLock::new(Arc::new(MemoryStore::from_snapshot(snapshot))),
            path,
            write_lock: TokioMutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn current(&self) -> Arc<MemoryStore> {
        self.cache.read().await.clone()
    }

    /// Replace the cache with what is on disk now
    async fn reload(&self) -> Result<Arc<MemoryStore>> {
        let _guard = self.write_lock.lock().await;
        let fresh = Arc::new(MemoryStore::from_snapshot(read_snapshot(&self.path).await?));
        *self.cache.write().await = fresh.clone();
        Ok(fresh)
    }

    async fn commit<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&MemoryStore) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let staged = MemoryStore::from_snapshot(read_snapshot(&self.path).await?);
        apply(&staged)?;
        write_snapshot(&self.path, &staged.snapshot()).await?;

        *self.cache.write().await = Arc::new(staged);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn find_principal(&self, id: &str) -> Result<Option<Principal>> {
        if let Some(principal) = self.current().await.find_principal(id).await? {
            return Ok(Some(principal));
        }
        // Another process may have registered it since the last load
        self.reload().await?.find_principal(id).await
    }

    async fn insert_principal(&self, principal: Principal) -> Result<()> {
        self.commit(move |staged| staged.put_principal(principal)).await
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        self.current().await.list_principals().await
    }

    async fn llm_credential(&self, user_id: &str) -> Result<Option<LlmCredential>> {
        self.current().await.llm_credential(user_id).await
    }

    async fn upsert_llm_credential(&self, user_id: &str, record: LlmCredential) -> Result<()> {
        self.commit(move |staged| staged.put_llm_credential(user_id, record))
            .await
    }

    async fn agent_credential(&self, user_id: &str) -> Result<Option<AgentCredential>> {
        self.current().await.agent_credential(user_id).await
    }

    async fn upsert_agent_credential(
        &self,
        user_id: &str,
        record: AgentCredential,
    ) -> Result<()> {
        self.commit(move |staged| staged.put_agent_credential(user_id, record))
            .await
    }

    async fn user_prompt(&self, user_id: &str) -> Result<Option<String>> {
        self.current().await.user_prompt(user_id).await
    }

    async fn upsert_user_prompt(&self, user_id: &str, content: String) -> Result<()> {
        self.commit(move |staged| staged.put_user_prompt(user_id, content))
            .await
    }
}
