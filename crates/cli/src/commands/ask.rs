//! `vitacoach ask` — Single-query mode.

use vitacoach_config::AppConfig;

pub async fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut manager = super::build_manager(&config).await?;

    eprint!("  Thinking...");
    let outcome = manager.process_query(query).await?;
    eprint!("\r              \r");

    println!("{}", outcome.response);

    tracing::debug!(
        intent = %outcome.intent,
        confidence = outcome.confidence,
        model = %outcome.model_used,
        tokens = outcome.tokens,
        "Query answered"
    );

    Ok(())
}
