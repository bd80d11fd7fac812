//! CLI command implementations.

pub mod chat;
pub mod onboard;
pub mod status;
pub mod sync;

use socialcare_config::{AppConfig, StoreBackend};
use socialcare_engine::{AssistantEngine, ContextRetriever, InitReport};
use socialcare_providers::build_generator;
use socialcare_store::{
    InMemoryBackend, JsonlBackend, KnowledgeBackend, KnowledgeStore, SqliteBackend,
};
use std::sync::Arc;

/// Build the knowledge backend selected by configuration.
pub(crate) async fn build_backend(
    config: &AppConfig,
) -> Result<Arc<dyn KnowledgeBackend>, Box<dyn std::error::Error>> {
    let backend: Arc<dyn KnowledgeBackend> = match config.store.backend {
        StoreBackend::Sqlite => {
            let path = config.store_path();
            Arc::new(SqliteBackend::new(&path.to_string_lossy()).await?)
        }
        StoreBackend::Jsonl => Arc::new(JsonlBackend::new(config.store_path())),
        StoreBackend::Memory => Arc::new(InMemoryBackend::new()),
    };
    Ok(backend)
}

/// Wire the full engine from configuration and bring it up.
pub(crate) async fn build_engine(
    config: &AppConfig,
) -> Result<(Arc<AssistantEngine>, InitReport), Box<dyn std::error::Error>> {
    // Data files live under the config directory
    std::fs::create_dir_all(AppConfig::config_dir())?;

    let store = KnowledgeStore::new(build_backend(config).await?);
    let generator = build_generator(config)?;
    let retriever =
        ContextRetriever::new(config.retrieval.top_k, config.retrieval.max_context_chars);

    let engine = Arc::new(
        AssistantEngine::new(store, generator, retriever).with_manual_path(config.manual_path()),
    );
    let report = engine.init().await;

    Ok((engine, report))
}
