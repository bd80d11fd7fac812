//! Assistant engine for socialcare: retrieval, prompt assembly and
//! chat session management over a knowledge store and a generator.

pub mod engine;
pub mod retriever;
pub mod session;

pub use engine::{AssistantEngine, InitReport, SyncReport};
pub use retriever::{ContextRetriever, TRUNCATION_MARKER};
pub use session::{AnswerStream, ChatSession};
