//! The text generation boundary.
//!
//! [`Generator`] is the only seam through which the assistant talks to
//! a language model. Implementations live in `socialcare-providers`;
//! everything above this trait is provider-agnostic.
//!
//! Streaming backends differ in what a chunk carries: some emit only
//! the new text since the previous chunk (deltas), others re-emit the
//! whole answer so far. [`ChunkKind`] tags each chunk and
//! [`CumulativeText`] folds either shape into one growing string, so
//! consumers never see the difference.

use crate::error::GenerationError;
use crate::prompt::PromptPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// How the text of a [`GenerationChunk`] relates to the chunks before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Text is an increment to append to everything received so far.
    #[default]
    Delta,
    /// Text is the full answer so far and replaces everything received.
    Cumulative,
}

/// One unit of streamed generation output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationChunk {
    /// Text carried by this chunk, if any. A final chunk may carry none.
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub kind: ChunkKind,

    /// True on the last chunk of a successful generation.
    #[serde(default)]
    pub done: bool,
}

impl GenerationChunk {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            kind: ChunkKind::Delta,
            done: false,
        }
    }

    pub fn cumulative(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            kind: ChunkKind::Cumulative,
            done: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            text: None,
            kind: ChunkKind::Delta,
            done: true,
        }
    }
}

/// Folds a stream of [`GenerationChunk`]s into the full answer so far.
///
/// `apply` returns whether the accumulated text actually changed, so a
/// caller can skip re-rendering on empty chunks.
#[derive(Debug, Default)]
pub struct CumulativeText {
    full: String,
}

impl CumulativeText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, chunk: &GenerationChunk) -> bool {
        let Some(text) = chunk.text.as_deref() else {
            return false;
        };
        if text.is_empty() {
            return false;
        }
        match chunk.kind {
            ChunkKind::Delta => self.full.push_str(text),
            ChunkKind::Cumulative => {
                self.full.clear();
                self.full.push_str(text);
            }
        }
        true
    }

    pub fn text(&self) -> &str {
        &self.full
    }

    pub fn into_text(self) -> String {
        self.full
    }
}

/// A text generation backend.
///
/// `complete` is the one required method. The default `stream` wraps it
/// in a single-chunk channel, so non-streaming backends get a streaming
/// surface for free; real streaming backends override it.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short human-readable backend name, used in logs and status output.
    fn name(&self) -> &str;

    /// Generate the complete answer for an assembled prompt.
    async fn complete(&self, payload: &PromptPayload) -> Result<String, GenerationError>;

    /// Generate the answer as a stream of chunks.
    ///
    /// The channel closing without a `done` chunk or an error means the
    /// backend stopped cleanly; consumers treat it the same as `done`.
    async fn stream(
        &self,
        payload: &PromptPayload,
    ) -> Result<mpsc::Receiver<Result<GenerationChunk, GenerationError>>, GenerationError> {
        let full = self.complete(payload).await?;
        let (tx, rx) = mpsc::channel(1);
        let chunk = GenerationChunk {
            text: Some(full),
            kind: ChunkKind::Cumulative,
            done: true,
        };
        // Capacity 1 guarantees this send succeeds.
        let _ = tx.send(Ok(chunk)).await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt;

    struct FixedGenerator;

    #[async_trait]
    impl Generator for FixedGenerator {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _payload: &PromptPayload) -> Result<String, GenerationError> {
            Ok("전체 답변".to_string())
        }
    }

    #[tokio::test]
    async fn default_stream_emits_one_cumulative_done_chunk() {
        let generator = FixedGenerator;
        let payload = prompt::assemble("질문", None);
        let mut rx = generator.stream(&payload).await.unwrap();

        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.text.as_deref(), Some("전체 답변"));
        assert_eq!(chunk.kind, ChunkKind::Cumulative);
        assert!(chunk.done);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn cumulative_text_appends_deltas() {
        let mut acc = CumulativeText::new();
        assert!(acc.apply(&GenerationChunk::delta("안녕")));
        assert!(acc.apply(&GenerationChunk::delta("하세요")));
        assert_eq!(acc.text(), "안녕하세요");
    }

    #[test]
    fn cumulative_text_replaces_on_cumulative_chunks() {
        let mut acc = CumulativeText::new();
        acc.apply(&GenerationChunk::cumulative("안녕"));
        acc.apply(&GenerationChunk::cumulative("안녕하세요"));
        assert_eq!(acc.text(), "안녕하세요");
    }

    #[test]
    fn mixed_kinds_converge_to_the_same_answer() {
        let mut acc = CumulativeText::new();
        acc.apply(&GenerationChunk::delta("안녕"));
        acc.apply(&GenerationChunk::cumulative("안녕하"));
        acc.apply(&GenerationChunk::delta("세요"));
        assert_eq!(acc.text(), "안녕하세요");
    }

    #[test]
    fn empty_chunks_do_not_change_text() {
        let mut acc = CumulativeText::new();
        acc.apply(&GenerationChunk::delta("답변"));
        assert!(!acc.apply(&GenerationChunk::finished()));
        assert!(!acc.apply(&GenerationChunk::delta("")));
        assert_eq!(acc.text(), "답변");
    }

    #[test]
    fn chunk_deserializes_with_defaults() {
        let chunk: GenerationChunk = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(chunk.kind, ChunkKind::Delta);
        assert!(!chunk.done);

        let done: GenerationChunk = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(done.done);
        assert!(done.text.is_none());
    }

    #[test]
    fn chunk_kind_serializes_snake_case() {
        let json = serde_json::to_string(&GenerationChunk::cumulative("x")).unwrap();
        assert!(json.contains(r#""kind":"cumulative""#));
    }
}
