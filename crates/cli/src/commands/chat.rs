//! `socialcare chat`: interactive counseling session.

use socialcare_config::{AppConfig, ProviderKind};
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(question: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for the API key early and give a clear error
    if config.provider.kind == ProviderKind::Gemini && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GEMINI_API_KEY='...'      (recommended)");
        eprintln!("    export SOCIALCARE_API_KEY='...'  (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Get a Gemini key at: https://aistudio.google.com/apikey");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let (engine, report) = super::build_engine(&config).await?;
    let session = engine.session();

    if let Some(question) = question {
        // Single question mode
        eprint!("  생각 중...");
        let stream = session.send(&question).await?;
        let answer = stream.collect_final().await?;
        eprint!("\r            \r");
        println!("{answer}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      socialcare — Counseling Assistant       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Generator:  {} ({})", engine.generator_name(), config.provider.model);
    println!("  Store:      {}", engine.store().backend_name());
    println!(
        "  Knowledge:  {} entries{}",
        report.loaded,
        if report.manual_seeded { " + manual" } else { "" }
    );
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    println!("  상담사 > {}", session.greeting());
    println!();

    let mut questions = spawn_stdin_reader();

    print!("  실무자 > ");
    std::io::stdout().flush()?;

    while let Some(question) = questions.recv().await {
        match session.send(&question).await {
            Ok(mut stream) => {
                print!("  상담사 > ");
                std::io::stdout().flush()?;

                let mut printed = String::new();
                while let Some(result) = stream.next().await {
                    match result {
                        Ok(full) => {
                            // Each update carries the whole answer so far;
                            // print only the new tail
                            match full.strip_prefix(printed.as_str()) {
                                Some(tail) => print!("{tail}"),
                                None => print!("\n  상담사 > {full}"),
                            }
                            std::io::stdout().flush()?;
                            printed = full;
                        }
                        Err(e) => {
                            println!();
                            eprintln!("  [오류] 상담 중 오류가 발생했습니다: {e}");
                            break;
                        }
                    }
                }
                println!();
                println!();
            }
            Err(e) => {
                eprintln!("  [오류] {e}");
            }
        }

        print!("  실무자 > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  상담을 종료합니다.");
    println!();

    Ok(())
}

/// Read stdin lines on a background task.
///
/// Exit words close the channel, which ends the session loop.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let stdin = io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }

                    if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
                        break;
                    }

                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF (Ctrl+D)
                Err(_) => break,
            }
        }
    });

    rx
}
