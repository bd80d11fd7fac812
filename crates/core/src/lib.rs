//! # Socialcare Core
//!
//! Domain types, traits, and error definitions for the socialcare work
//! assistant. This crate has **zero framework dependencies**: it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The seams are traits defined here: [`Generator`] for text generation
//! backends, with storage behind its own trait in `socialcare-store`.
//! Implementations live in their respective crates. This enables:
//! - Swapping backends via configuration, not fallback ladders
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod generator;
pub mod knowledge;
pub mod prompt;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, Result, StoreError};
pub use generator::{ChunkKind, CumulativeText, GenerationChunk, Generator};
pub use knowledge::{validate_records, KnowledgeEntry, SyncRecord, MANUAL_ENTRY_ID};
pub use prompt::{assemble, PromptPayload, GREETING};
