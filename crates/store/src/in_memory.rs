//! In-memory backend, useful for testing and ephemeral sessions.

use crate::backend::KnowledgeBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialcare_core::error::StoreError;
use socialcare_core::knowledge::KnowledgeEntry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory backend that stores entries in a Vec.
/// Nothing survives the process; sessions start from an empty set.
pub struct InMemoryBackend {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
    last_synced: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            last_synced: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn replace_all(&self, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
        *self.entries.write().await = entries.to_vec();
        *self.last_synced.write().await = Some(Utc::now());
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }

    async fn last_synced(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(*self.last_synced.read().await)
    }
}
