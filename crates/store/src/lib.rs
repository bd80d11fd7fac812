//! Knowledge storage for the socialcare assistant.

pub mod backend;
pub mod in_memory;
pub mod jsonl;
pub mod manual;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::KnowledgeBackend;
pub use in_memory::InMemoryBackend;
pub use jsonl::JsonlBackend;
pub use manual::load_manual;
pub use store::KnowledgeStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
