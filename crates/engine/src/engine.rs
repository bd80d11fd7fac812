//! The assistant engine: the one place where store, retriever and
//! generator meet.
//!
//! A single engine instance is constructed by the application entry
//! point and injected into whatever surface needs it; there is no
//! ambient global. Repeat initialization is a no-op guarded by a
//! one-shot flag held as instance state.

use crate::retriever::ContextRetriever;
use crate::session::ChatSession;
use socialcare_core::error::Result;
use socialcare_core::generator::{GenerationChunk, Generator};
use socialcare_core::knowledge::{validate_records, SyncRecord};
use socialcare_core::prompt::{self, PromptPayload};
use socialcare_core::GenerationError;
use socialcare_store::{load_manual, KnowledgeStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Orchestrates retrieval, prompt assembly and generation.
pub struct AssistantEngine {
    store: KnowledgeStore,
    generator: Arc<dyn Generator>,
    retriever: ContextRetriever,
    manual_path: Option<PathBuf>,
    initialized: AtomicBool,
}

/// What [`AssistantEngine::init`] found at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// True when init had already run and nothing was redone.
    pub already_initialized: bool,
    /// Entries loaded from the backend into the snapshot.
    pub loaded: usize,
    /// Whether the local manual file was seeded.
    pub manual_seeded: bool,
}

/// Outcome of one knowledge sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Records accepted into the store.
    pub accepted: usize,
    /// Records skipped by validation.
    pub skipped: usize,
}

impl AssistantEngine {
    pub fn new(
        store: KnowledgeStore,
        generator: Arc<dyn Generator>,
        retriever: ContextRetriever,
    ) -> Self {
        Self {
            store,
            generator,
            retriever,
            manual_path: None,
            initialized: AtomicBool::new(false),
        }
    }

    /// Seed the snapshot from this manual file during [`init`](Self::init).
    pub fn with_manual_path(mut self, path: PathBuf) -> Self {
        self.manual_path = Some(path);
        self
    }

    /// One-shot startup: load persisted knowledge, then seed the local
    /// manual. Failures on either step degrade to an emptier snapshot
    /// instead of propagating; the assistant must come up regardless.
    pub async fn init(&self) -> InitReport {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Engine already initialized; skipping");
            return InitReport {
                already_initialized: true,
                loaded: self.store.count().await,
                manual_seeded: false,
            };
        }

        let loaded = self.store.load().await;

        let manual_seeded = match &self.manual_path {
            Some(path) => match load_manual(path) {
                Some(entry) => self.store.seed(vec![entry]).await > 0,
                None => false,
            },
            None => false,
        };

        info!(
            loaded,
            manual_seeded,
            generator = self.generator.name(),
            "Assistant engine initialized"
        );

        InitReport {
            already_initialized: false,
            loaded,
            manual_seeded,
        }
    }

    /// Replace all knowledge with a batch from an external sync source.
    ///
    /// Invalid records are skipped with a warning; the store swap is
    /// atomic, so a failed sync leaves the previous set fully readable.
    pub async fn sync(&self, records: Vec<SyncRecord>) -> Result<SyncReport> {
        let total = records.len();
        let entries = validate_records(records);
        let accepted = entries.len();
        let skipped = total - accepted;

        self.store.replace_all(entries).await?;

        info!(accepted, skipped, "Knowledge synced");
        Ok(SyncReport { accepted, skipped })
    }

    /// Open an interactive session against this engine.
    pub fn session(self: &Arc<Self>) -> ChatSession {
        ChatSession::new(Arc::clone(self))
    }

    /// The knowledge store, for status reporting.
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Name of the configured generator backend.
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Assemble the prompt for one question against the current snapshot.
    pub(crate) async fn prepare(&self, question: &str) -> PromptPayload {
        let snapshot = self.store.snapshot().await;
        let context = self.retriever.retrieve(question, &snapshot);
        match &context {
            Some(ctx) => debug!(context_chars = ctx.chars().count(), "Context retrieved"),
            None => debug!("No relevant context; answering from general knowledge"),
        }
        prompt::assemble(question, context.as_deref())
    }

    /// Start generating an answer; chunks arrive in produced order.
    pub(crate) async fn answer_stream(
        &self,
        question: &str,
    ) -> Result<mpsc::Receiver<std::result::Result<GenerationChunk, GenerationError>>> {
        let payload = self.prepare(question).await;
        let rx = self.generator.stream(&payload).await?;
        Ok(rx)
    }
}
