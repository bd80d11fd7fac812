//! `socialcare onboard`: first-time setup.

use socialcare_config::AppConfig;

/// Starter manual so a fresh install has something to retrieve from.
const MANUAL_STUB: &str = "\
아동학대 신고 접수 시 24시간 이내에 현장 조사를 실시한다.
응급 상황에서는 즉시 112 또는 119에 신고하고 아동을 분리 보호한다.
상담 기록은 개인정보 보호 지침에 따라 외부 반출을 금지한다.
사례 판정 회의는 접수 후 72시간 이내에 개최하는 것을 원칙으로 한다.
";

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🤝 socialcare — First-Time Setup");
    println!("================================\n");

    // Create the config directory
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // Seed a starter manual
    let manual_path = config_dir.join("manual.txt");
    if !manual_path.exists() {
        std::fs::write(&manual_path, MANUAL_STUB)?;
        println!("✅ Created manual.txt (replace it with your counseling manual)");
    }

    // Create config file
    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        let default_toml = AppConfig::default_toml();
        std::fs::write(&config_path, &default_toml)?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your Gemini API key", config_path.display());
        println!("   2. Run: socialcare sync --sample");
        println!("   3. Run: socialcare chat\n");
    }

    println!("🎉 Setup complete! Run `socialcare chat` to start a session.\n");

    Ok(())
}
