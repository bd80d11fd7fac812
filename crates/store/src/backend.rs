//! Knowledge backend trait: persistent storage for manual entries.
//!
//! The assistant reads knowledge from an in-process snapshot, so a
//! backend only needs bulk operations: load everything at startup and
//! atomically replace everything on sync. There is no per-entry CRUD
//! surface and no query pushdown; retrieval ranking happens above the
//! store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialcare_core::error::StoreError;
use socialcare_core::knowledge::KnowledgeEntry;

/// The storage backend trait.
///
/// Implementations: SQLite, JSONL file, in-memory (for testing).
#[async_trait]
pub trait KnowledgeBackend: Send + Sync {
    /// The backend name (e.g., "sqlite", "jsonl", "memory").
    fn name(&self) -> &str;

    /// Load every stored entry, in stable storage order.
    async fn load_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Atomically replace the entire stored set with `entries`.
    ///
    /// Either every entry lands and the old set is gone, or the call
    /// fails and the old set is still fully readable. Partial states
    /// must never be observable, even across a crash.
    async fn replace_all(&self, entries: &[KnowledgeEntry]) -> Result<(), StoreError>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize, StoreError>;

    /// When the stored set was last replaced, if the backend tracks it.
    async fn last_synced(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(None)
    }
}
