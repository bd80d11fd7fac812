//! Lexical context retrieval over the knowledge snapshot.
//!
//! Given a question and the current entries, picks the sentence
//! fragments sharing the most keywords with the question and packs them
//! into one bounded text block. Scoring is plain case-sensitive
//! containment of distinct keywords, so ranking is deterministic and
//! instant over the few hundred fragments a manual yields. No
//! embeddings, no model calls.

use socialcare_core::knowledge::KnowledgeEntry;
use tracing::debug;

/// Appended when the packed context had to be cut at the budget.
pub const TRUNCATION_MARKER: &str = "…(이하 생략)";

/// Separator between packed fragments.
const FRAGMENT_SEPARATOR: &str = "\n";

/// Minimum trimmed fragment length (in chars) worth ranking.
const MIN_FRAGMENT_CHARS: usize = 5;

/// A candidate fragment with its keyword-overlap score.
#[derive(Debug)]
struct ScoredFragment<'a> {
    text: &'a str,
    score: usize,
}

/// Ranks sentence fragments by keyword overlap with the question.
#[derive(Debug, Clone)]
pub struct ContextRetriever {
    top_k: usize,
    max_context_chars: usize,
}

impl ContextRetriever {
    pub fn new(top_k: usize, max_context_chars: usize) -> Self {
        Self {
            top_k,
            max_context_chars,
        }
    }

    /// Retrieve the context block for one question.
    ///
    /// Returns `None` when the entry set is empty, the question has no
    /// usable keywords, or no fragment shares a keyword with it. There
    /// is no weak fallback to recent entries: an unrelated excerpt
    /// misleads more than it helps, and the prompt layer states plainly
    /// when no material was found.
    pub fn retrieve(&self, query: &str, entries: &[KnowledgeEntry]) -> Option<String> {
        if entries.is_empty() {
            return None;
        }

        let keywords = Self::keywords(query);
        if keywords.is_empty() {
            debug!("No usable keywords in query");
            return None;
        }

        let mut fragments: Vec<ScoredFragment> = Vec::new();
        for entry in entries {
            for text in Self::fragments(&entry.content) {
                // Each distinct keyword counts once, however often it occurs
                let score = keywords.iter().filter(|kw| text.contains(*kw)).count();
                if score > 0 {
                    fragments.push(ScoredFragment { text, score });
                }
            }
        }

        if fragments.is_empty() {
            debug!(keywords = keywords.len(), "No fragment matched any keyword");
            return None;
        }

        // Stable sort keeps manual order among equal scores
        fragments.sort_by(|a, b| b.score.cmp(&a.score));
        fragments.truncate(self.top_k);

        let packed = fragments
            .iter()
            .map(|f| f.text)
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR);

        Some(self.truncate(packed))
    }

    /// Distinct whitespace-separated keywords; single characters are
    /// dropped, they carry no discriminative value for this matcher.
    fn keywords(query: &str) -> Vec<&str> {
        let mut keywords: Vec<&str> = Vec::new();
        for token in query.split_whitespace() {
            if token.chars().count() <= 1 {
                continue;
            }
            if !keywords.contains(&token) {
                keywords.push(token);
            }
        }
        keywords
    }

    /// Sentence fragments of one entry, in content order.
    fn fragments(content: &str) -> impl Iterator<Item = &str> {
        content
            .split(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|fragment| fragment.chars().count() >= MIN_FRAGMENT_CHARS)
    }

    /// Cut the packed block at the character budget, marking the cut.
    fn truncate(&self, packed: String) -> String {
        if packed.chars().count() <= self.max_context_chars {
            return packed;
        }
        let mut cut: String = packed.chars().take(self.max_context_chars).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}
