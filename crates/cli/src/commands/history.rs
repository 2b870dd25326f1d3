//! `vitacoach history` — Show recent conversation turns.

use vitacoach_config::AppConfig;

pub async fn run(limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = super::open_store(&config).await?;

    let turns = store.latest_turns(limit).await?;
    if turns.is_empty() {
        println!();
        println!("  No conversations recorded yet. Try `vitacoach ask \"...\"`.");
        println!();
        return Ok(());
    }

    println!();
    for turn in &turns {
        println!(
            "  [{}] {} ({} · {} tokens · ${:.4})",
            turn.timestamp.format("%Y-%m-%d %H:%M"),
            turn.intent,
            turn.model,
            turn.tokens_used,
            turn.cost_usd
        );
        println!("    You  > {}", turn.user_query);
        let mut lines = turn.assistant_response.lines();
        if let Some(first) = lines.next() {
            println!("    Coach> {first}");
        }
        if lines.next().is_some() {
            println!("           ...");
        }
        println!();
    }

    Ok(())
}
