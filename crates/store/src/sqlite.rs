//! SQLite backend: durable knowledge storage in a single database file.
//!
//! Uses two tables:
//! - `knowledge`: the stored entries, with an integer rowid preserving
//!   sync order
//! - `sync_meta`: key/value metadata, currently just the last sync time
//!
//! `replace_all` runs as one transaction, so a failed sync leaves the
//! previous entry set untouched.

use crate::backend::KnowledgeBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialcare_core::error::StoreError;
use socialcare_core::knowledge::KnowledgeEntry;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A production SQLite knowledge backend.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Create a new SQLite backend from a file path.
    ///
    /// The database and all tables are created automatically.
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        info!("SQLite knowledge backend initialized at {path}");
        Ok(backend)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let backend = Self { pool };
        backend.run_migrations().await?;
        Ok(backend)
    }

    /// Run schema migrations, creating the knowledge and metadata tables.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        // Integer rowid alias keeps load_all in sync order
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge (
                iid      INTEGER PRIMARY KEY AUTOINCREMENT,
                id       TEXT UNIQUE NOT NULL,
                content  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("knowledge table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_meta (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("sync_meta table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `KnowledgeEntry` from a SQLite row.
    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeEntry, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        Ok(KnowledgeEntry { id, content })
    }
}

#[async_trait]
impl KnowledgeBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let rows = sqlx::query("SELECT id, content FROM knowledge ORDER BY iid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Load all: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn replace_all(&self, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("Begin transaction: {e}")))?;

        sqlx::query("DELETE FROM knowledge")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("Clear knowledge: {e}")))?;

        for entry in entries {
            sqlx::query("INSERT INTO knowledge (id, content) VALUES (?1, ?2)")
                .bind(&entry.id)
                .bind(&entry.content)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Storage(format!("Insert entry {}: {e}", entry.id)))?;
        }

        sqlx::query(
            r#"
            INSERT INTO sync_meta (key, value) VALUES ('last_synced', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("Record sync time: {e}")))?;

        // Dropping an uncommitted transaction rolls it back
        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("Commit replace: {e}")))?;

        debug!(count = entries.len(), "Replaced knowledge set");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM knowledge")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }

    async fn last_synced(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row = sqlx::query("SELECT value FROM sync_meta WHERE key = 'last_synced'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Sync meta: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|e| StoreError::QueryFailed(format!("value column: {e}")))?;

        match DateTime::parse_from_rfc3339(&value) {
            Ok(dt) => Ok(Some(dt.with_timezone(&Utc))),
            Err(e) => {
                warn!(error = %e, value = %value, "Ignoring unparseable last_synced timestamp");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_backend() -> SqliteBackend {
        SqliteBackend::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn starts_empty() {
        let db = test_backend().await;
        assert!(db.load_all().await.unwrap().is_empty());
        assert_eq!(db.count().await.unwrap(), 0);
        assert!(db.last_synced().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_then_load_preserves_order() {
        let db = test_backend().await;
        let entries = vec![
            KnowledgeEntry::new("2", "개인정보 보호 정책: 모든 상담 기록은 외부 반출을 엄격히 금지함."),
            KnowledgeEntry::new("1", "응급 위기 개입: 즉시 119 신고 및 주변 동료 지원 요청."),
            KnowledgeEntry::new("3", "야간 당직 규정."),
        ];
        db.replace_all(&entries).await.unwrap();

        let loaded = db.load_all().await.unwrap();
        assert_eq!(loaded, entries);
        assert_eq!(db.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn replace_discards_previous_set() {
        let db = test_backend().await;
        db.replace_all(&[
            KnowledgeEntry::new("old_a", "first"),
            KnowledgeEntry::new("old_b", "second"),
        ])
        .await
        .unwrap();

        db.replace_all(&[KnowledgeEntry::new("new", "third")])
            .await
            .unwrap();

        let loaded = db.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "new");
    }

    #[tokio::test]
    async fn replace_with_empty_clears() {
        let db = test_backend().await;
        db.replace_all(&[KnowledgeEntry::new("x", "entry")])
            .await
            .unwrap();
        db.replace_all(&[]).await.unwrap();
        assert_eq!(db.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_ids_fail_and_keep_previous_set() {
        let db = test_backend().await;
        db.replace_all(&[KnowledgeEntry::new("1", "intact")])
            .await
            .unwrap();

        let dup = [
            KnowledgeEntry::new("a", "first"),
            KnowledgeEntry::new("a", "second"),
        ];
        assert!(db.replace_all(&dup).await.is_err());

        let loaded = db.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "intact");
    }

    #[tokio::test]
    async fn last_synced_set_after_replace() {
        let db = test_backend().await;
        let before = Utc::now();
        db.replace_all(&[KnowledgeEntry::new("1", "entry")])
            .await
            .unwrap();

        let synced = db.last_synced().await.unwrap().unwrap();
        assert!(synced >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn backend_name() {
        let db = test_backend().await;
        assert_eq!(db.name(), "sqlite");
    }
}
