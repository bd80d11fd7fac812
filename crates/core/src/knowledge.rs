//! Knowledge entry domain type and the sync ingestion boundary.
//!
//! A knowledge entry is one stored unit of reference material (manual
//! text or a synced note) with a stable identifier. External sync
//! sources hand us loosely shaped `{id, content}` records;
//! [`validate_records`] is the single place where that outside shape is
//! checked before it may touch the store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One stored unit of reference material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Opaque unique identifier, stable across updates to the same
    /// logical source item. Unique within the store at any point in time.
    pub id: String,

    /// Raw manual/snippet text (UTF-8). Empty is permitted and treated
    /// as no-content.
    pub content: String,
}

impl KnowledgeEntry {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Reserved id for the entry seeded from the local manual file.
pub const MANUAL_ENTRY_ID: &str = "manual";

/// A raw record as received from an external sync source.
///
/// Fields are deliberately loose so one malformed record cannot fail
/// deserialization of the whole batch; [`validate_records`] decides
/// what is usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

impl SyncRecord {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            content: Some(serde_json::Value::String(content.into())),
        }
    }
}

/// Validate a batch of sync records into knowledge entries.
///
/// Records with a missing/empty id or a non-string content are skipped
/// with a logged warning rather than failing the batch. Duplicate ids
/// within a batch keep one entry per id: the first occurrence keeps its
/// position, the last content wins.
pub fn validate_records(records: Vec<SyncRecord>) -> Vec<KnowledgeEntry> {
    let mut entries: Vec<KnowledgeEntry> = Vec::with_capacity(records.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for (position, record) in records.into_iter().enumerate() {
        let Some(id) = record.id.filter(|id| !id.is_empty()) else {
            warn!(position, "Skipping sync record without an id");
            continue;
        };

        let content = match record.content {
            Some(serde_json::Value::String(text)) => text,
            other => {
                warn!(position, id = %id, content = ?other, "Skipping sync record with non-string content");
                continue;
            }
        };

        match index_by_id.get(&id) {
            Some(&existing) => {
                warn!(id = %id, "Duplicate id in sync batch; keeping the latest content");
                entries[existing].content = content;
            }
            None => {
                index_by_id.insert(id.clone(), entries.len());
                entries.push(KnowledgeEntry { id, content });
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_records_pass_through_in_order() {
        let records = vec![
            SyncRecord::new("1", "응급 위기 개입: 즉시 119 신고 및 주변 동료 지원 요청."),
            SyncRecord::new("2", "개인정보 보호 정책: 모든 상담 기록은 외부 반출을 엄격히 금지함."),
        ];
        let entries = validate_records(records);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "1");
        assert!(entries[0].content.contains("119"));
        assert_eq!(entries[1].id, "2");
    }

    #[test]
    fn record_without_id_is_skipped() {
        let records = vec![
            SyncRecord {
                id: None,
                content: Some(serde_json::Value::String("no id".into())),
            },
            SyncRecord::new("ok", "kept"),
        ];
        let entries = validate_records(records);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "ok");
    }

    #[test]
    fn record_with_empty_id_is_skipped() {
        let records = vec![SyncRecord::new("", "empty id")];
        assert!(validate_records(records).is_empty());
    }

    #[test]
    fn record_with_non_string_content_is_skipped() {
        let records = vec![
            SyncRecord {
                id: Some("n".into()),
                content: Some(serde_json::json!(42)),
            },
            SyncRecord {
                id: Some("null".into()),
                content: Some(serde_json::Value::Null),
            },
            SyncRecord {
                id: Some("missing".into()),
                content: None,
            },
        ];
        assert!(validate_records(records).is_empty());
    }

    #[test]
    fn empty_content_is_permitted() {
        let entries = validate_records(vec![SyncRecord::new("e", "")]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "");
    }

    #[test]
    fn duplicate_id_keeps_position_and_latest_content() {
        let records = vec![
            SyncRecord::new("dup", "first"),
            SyncRecord::new("other", "middle"),
            SyncRecord::new("dup", "second"),
        ];
        let entries = validate_records(records);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "dup");
        assert_eq!(entries[0].content, "second");
        assert_eq!(entries[1].id, "other");
    }

    #[test]
    fn loose_batch_deserializes_despite_bad_records() {
        let json = r#"[
            {"id": "1", "content": "ok"},
            {"content": "no id"},
            {"id": "3", "content": 7}
        ]"#;
        let records: Vec<SyncRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);
        let entries = validate_records(records);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "1");
    }

    #[test]
    fn entry_serialization_roundtrip() {
        let entry = KnowledgeEntry::new("manual", "응급 상황 시 즉시 119 신고.");
        let json = serde_json::to_string(&entry).unwrap();
        let back: KnowledgeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
