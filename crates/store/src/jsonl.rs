//! File-based knowledge backend: persistent JSON-lines storage.
//!
//! Each line of the file is one JSON-encoded `KnowledgeEntry`. The
//! format is human-inspectable and diff-friendly, which suits a manual
//! that workers occasionally want to audit by hand.

use crate::backend::KnowledgeBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socialcare_core::error::StoreError;
use socialcare_core::knowledge::KnowledgeEntry;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A file-backed knowledge store using JSONL (one JSON object per line).
///
/// The backend holds no cache; `load_all` reads the file fresh and
/// `replace_all` rewrites it through a temp-file rename, so the file on
/// disk always holds either the previous set or the new one.
pub struct JsonlBackend {
    path: PathBuf,
}

impl JsonlBackend {
    /// Create a new file-based backend at the given path.
    ///
    /// The file does not have to exist yet; it is created on first sync.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[async_trait]
impl KnowledgeBackend for JsonlBackend {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn load_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            // File not created yet is a normal first-run state
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let entries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<KnowledgeEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted knowledge line");
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    async fn replace_all(&self, entries: &[KnowledgeEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Failed to create knowledge directory: {e}"))
                })?;
            }
        }

        let mut content = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            content.push_str(&line);
            content.push('\n');
        }

        // Write-then-rename: the real file never holds a partial set
        let tmp = self.tmp_path();
        std::fs::write(&tmp, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write knowledge file: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Storage(format!("Failed to replace knowledge file: {e}")))?;

        debug!(count = entries.len(), path = %self.path.display(), "Replaced knowledge set");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load_all().await?.len())
    }

    async fn last_synced(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map_err(|e| StoreError::Storage(format!("File mtime: {e}")))?;
                Ok(Some(DateTime::<Utc>::from(modified)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
