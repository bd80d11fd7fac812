//! `socialcare status`: show assistant status.

use socialcare_config::{AppConfig, StoreBackend};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🤝 socialcare Status");
    println!("====================");
    println!("  Config dir:  {}", AppConfig::config_dir().display());
    println!(
        "  Generator:   {} ({})",
        config.provider.kind.as_str(),
        config.provider.model
    );
    println!(
        "  API key:     {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!(
        "  Store:       {} at {}",
        config.store.backend.as_str(),
        config.store_path().display()
    );
    println!(
        "  Retrieval:   top {} fragments, {} chars max",
        config.retrieval.top_k, config.retrieval.max_context_chars
    );
    println!("  Manual:      {}", config.manual_path().display());

    // Knowledge counts straight from the backend; never create files here
    match config.store.backend {
        StoreBackend::Memory => {
            println!("  Knowledge:   (in-memory, empty at startup)");
        }
        _ if !config.store_path().exists() => {
            println!("  Knowledge:   (no data yet, run `socialcare sync`)");
        }
        _ => {
            let backend = super::build_backend(&config).await?;
            match backend.count().await {
                Ok(count) => println!("  Knowledge:   {count} entries"),
                Err(e) => println!("  Knowledge:   unavailable ({e})"),
            }
            match backend.last_synced().await {
                Ok(Some(at)) => println!("  Last sync:   {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
                Ok(None) => println!("  Last sync:   never"),
                Err(e) => println!("  Last sync:   unknown ({e})"),
            }
        }
    }

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `socialcare onboard` first");
    }

    Ok(())
}
