//! Error types for the socialcare domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the handling policy
//! lives with the callers: knowledge loads degrade to an empty set,
//! sync and generation failures surface to the caller unchanged.

use thiserror::Error;

/// The top-level error type for all socialcare operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Knowledge store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// A second send was attempted while a generation was still in
    /// flight for the same session.
    #[error("A generation is already in flight for this session")]
    Busy,

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_displays_correctly() {
        let err = Error::Generation(GenerationError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::Storage("disk full".into()));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn busy_error_mentions_in_flight() {
        assert!(Error::Busy.to_string().contains("in flight"));
    }

    #[test]
    fn generation_error_preserves_underlying_message() {
        // The caller decides user-facing wording; the raw message must
        // survive the trip up the stack.
        let err: Error = GenerationError::Network("connection refused".into()).into();
        assert!(err.to_string().contains("connection refused"));
    }
}
