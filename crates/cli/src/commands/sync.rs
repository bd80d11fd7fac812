//! `socialcare sync`: replace the knowledge base from a records file.

use socialcare_config::{AppConfig, ProviderKind};
use socialcare_core::SyncRecord;
use std::path::PathBuf;

/// Sample records for trying the pipeline without an export file.
const SAMPLE_RECORDS: &str = r#"[
  {"id": "1", "content": "응급 위기 개입: 즉시 119 신고 및 주변 동료 지원 요청."},
  {"id": "2", "content": "개인정보 보호 정책: 모든 상담 기록은 외부 반출을 엄격히 금지함."}
]"#;

pub async fn run(file: Option<PathBuf>, sample: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let (source, raw) = match (&file, sample) {
        (Some(path), _) => (
            path.display().to_string(),
            std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        ),
        (None, true) => ("built-in sample".to_string(), SAMPLE_RECORDS.to_string()),
        (None, false) => {
            return Err("Provide a records file or pass --sample".into());
        }
    };

    let records: Vec<SyncRecord> = serde_json::from_str(&raw)
        .map_err(|e| format!("Records file is not a JSON array of records: {e}"))?;

    println!("🔄 Syncing knowledge base from {source} ({} records)", records.len());

    // Sync never calls the model; the offline generator is enough.
    config.provider.kind = ProviderKind::Scripted;
    let (engine, _) = super::build_engine(&config).await?;

    let report = engine.sync(records).await?;

    println!(
        "✅ Sync complete: {} entries accepted, {} records skipped",
        report.accepted, report.skipped
    );
    println!(
        "   Store: {} ({} entries)",
        engine.store().backend_name(),
        engine.store().count().await
    );

    Ok(())
}
