//! The knowledge store: an in-process snapshot over a storage backend.
//!
//! Retrieval runs many reads per question and must never block on the
//! backend, so the store keeps the whole entry set in an immutable
//! snapshot (`Arc<[KnowledgeEntry]>`) that is swapped wholesale on sync.
//! A reader holding the old snapshot keeps a consistent pre-sync view;
//! nobody ever observes a half-replaced set.

use crate::backend::KnowledgeBackend;
use chrono::{DateTime, Utc};
use socialcare_core::error::StoreError;
use socialcare_core::knowledge::KnowledgeEntry;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Snapshot-backed store over a [`KnowledgeBackend`].
pub struct KnowledgeStore {
    backend: Arc<dyn KnowledgeBackend>,
    entries: RwLock<Arc<[KnowledgeEntry]>>,
    sync_lock: Mutex<()>,
}

impl KnowledgeStore {
    /// Create a store over a backend. The snapshot starts empty; call
    /// [`load`](Self::load) to populate it.
    pub fn new(backend: Arc<dyn KnowledgeBackend>) -> Self {
        Self {
            backend,
            entries: RwLock::new(Arc::from(Vec::new())),
            sync_lock: Mutex::new(()),
        }
    }

    /// Load persisted entries into the snapshot.
    ///
    /// Storage trouble must not kill the assistant at startup: a load
    /// failure is logged and the snapshot stays as it was (empty on
    /// first load). Returns the number of entries now in the snapshot.
    pub async fn load(&self) -> usize {
        match self.backend.load_all().await {
            Ok(loaded) => {
                let count = loaded.len();
                *self.entries.write().await = loaded.into();
                debug!(count, backend = self.backend.name(), "Knowledge snapshot loaded");
                count
            }
            Err(e) => {
                warn!(
                    error = %e,
                    backend = self.backend.name(),
                    "Failed to load knowledge; continuing without it"
                );
                self.entries.read().await.len()
            }
        }
    }

    /// Atomically replace all knowledge with a validated entry set.
    ///
    /// The backend commits first; only then is the snapshot swapped. On
    /// error the snapshot is untouched, so readers keep the pre-sync set
    /// (the backend guarantees the same on its side). Concurrent calls
    /// are serialized.
    pub async fn replace_all(&self, entries: Vec<KnowledgeEntry>) -> Result<(), StoreError> {
        let _guard = self.sync_lock.lock().await;
        self.backend.replace_all(&entries).await?;
        *self.entries.write().await = entries.into();
        Ok(())
    }

    /// A cheap immutable snapshot of the current entry set.
    pub async fn snapshot(&self) -> Arc<[KnowledgeEntry]> {
        self.entries.read().await.clone()
    }

    /// All entries as an owned copy. Mutating the copy never touches
    /// store state.
    pub async fn all(&self) -> Vec<KnowledgeEntry> {
        self.entries.read().await.to_vec()
    }

    /// Number of entries currently in the snapshot.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Append entries to the snapshot only, skipping ids that already
    /// exist. Used to seed the local manual without persisting it; the
    /// next sync replaces seeds along with everything else.
    pub async fn seed(&self, extra: Vec<KnowledgeEntry>) -> usize {
        let mut entries = self.entries.write().await;
        let mut merged = entries.to_vec();
        let mut added = 0;
        for entry in extra {
            if merged.iter().any(|e| e.id == entry.id) {
                debug!(id = %entry.id, "Seed entry already present; skipping");
                continue;
            }
            merged.push(entry);
            added += 1;
        }
        if added > 0 {
            *entries = merged.into();
        }
        added
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Entry count as persisted by the backend. Differs from
    /// [`count`](Self::count) when seeds were applied.
    pub async fn persisted_count(&self) -> Result<usize, StoreError> {
        self.backend.count().await
    }

    /// Last successful sync time, if the backend tracks one.
    pub async fn last_synced(&self) -> Option<DateTime<Utc>> {
        match self.backend.last_synced().await {
            Ok(ts) => ts,
            Err(e) => {
                warn!(error = %e, "Failed to read last sync time");
                None
            }
        }
    }
}
