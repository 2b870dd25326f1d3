//! `vitacoach alerts` — List, check for, or acknowledge health alerts.

use chrono::Local;
use std::sync::Arc;
use vitacoach_config::AppConfig;
use vitacoach_core::HealthStore;
use vitacoach_engine::AlertEngine;

pub async fn run(check: bool, ack: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = super::open_store(&config).await?;

    if let Some(id) = ack {
        if store.acknowledge_alert(id).await? {
            println!("  ✅ Alert {id} acknowledged");
        } else {
            println!("  No alert with id {id}");
        }
        return Ok(());
    }

    if check {
        let engine = AlertEngine::new(
            Arc::clone(&store) as Arc<dyn HealthStore>,
            super::user_profile(&config),
        );
        let triggered = engine.check_all(Local::now().date_naive()).await?;
        println!();
        println!("  Checks complete: {} new alert(s)", triggered.len());
    }

    let pending = store.unacknowledged_alerts(20).await?;
    if pending.is_empty() {
        println!();
        println!("  No unacknowledged alerts. All clear! ✅");
        println!();
        return Ok(());
    }

    println!();
    for alert in &pending {
        println!(
            "  [{}] #{} {} — {}",
            alert.priority.as_str(),
            alert.id,
            alert.title,
            alert.created_at.format("%Y-%m-%d %H:%M")
        );
        for line in alert.message.lines() {
            println!("      {line}");
        }
        println!();
    }
    println!("  Acknowledge with: vitacoach alerts --ack <id>");
    println!();

    Ok(())
}
