//! `vitacoach chat` — Interactive coaching session.

use tokio::io::{AsyncBufReadExt, BufReader};
use vitacoach_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut manager = super::build_manager(&config).await?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        VitaCoach — Interactive Session       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Coaching:  {}", config.profile.name);
    println!("  Primary:   {}", config.models.primary.model);
    println!("  Local:     {}", config.models.local.model);
    println!("  Session:   {}", manager.session_id());
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type '/new' for a fresh session, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    use std::io::Write;
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        match input {
            "" => {}
            "exit" | "quit" => break,
            "/new" => {
                manager.reset();
                println!();
                println!("  Started a new session: {}", manager.session_id());
                println!();
            }
            query => {
                eprint!("  ...");

                match manager.process_query(query).await {
                    Ok(outcome) => {
                        eprint!("\r     \r");
                        println!();
                        for line in outcome.response.lines() {
                            println!("  Coach > {line}");
                        }
                        println!();
                        tracing::debug!(
                            intent = %outcome.intent,
                            model = %outcome.model_used,
                            tokens = outcome.tokens,
                            cost_usd = outcome.cost_usd,
                            "Exchange complete"
                        );
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Take care! 👋");
    println!();

    Ok(())
}
