//! Local manual loader.
//!
//! Institutions keep a plain-text manual file next to the assistant. It
//! is read once at startup and seeded into the knowledge snapshot under
//! the reserved [`MANUAL_ENTRY_ID`]; a missing or unreadable file only
//! means the assistant starts without that entry.

use socialcare_core::knowledge::{KnowledgeEntry, MANUAL_ENTRY_ID};
use std::path::Path;
use tracing::{debug, warn};

/// Read the manual file into a seedable knowledge entry.
///
/// Returns `None` when the file is missing, unreadable, or blank; the
/// caller continues without manual content either way.
pub fn load_manual(path: &Path) -> Option<KnowledgeEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Manual file unavailable; continuing without it");
            return None;
        }
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        warn!(path = %path.display(), "Manual file is empty; continuing without it");
        return None;
    }

    debug!(path = %path.display(), chars = trimmed.chars().count(), "Manual loaded");
    Some(KnowledgeEntry::new(MANUAL_ENTRY_ID, trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_manual_under_reserved_id() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "아동학대 신고는 112 또는 182로 접수한다.").unwrap();

        let entry = load_manual(tmp.path()).unwrap();
        assert_eq!(entry.id, MANUAL_ENTRY_ID);
        assert_eq!(entry.content, "아동학대 신고는 112 또는 182로 접수한다.");
    }

    #[test]
    fn missing_file_yields_none() {
        assert!(load_manual(Path::new("/tmp/socialcare_no_such_manual.txt")).is_none());
    }

    #[test]
    fn blank_file_yields_none() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "   \n\n  ").unwrap();
        assert!(load_manual(tmp.path()).is_none());
    }
}
