//! `vitacoach briefing` — Print the morning briefing.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use vitacoach_config::AppConfig;
use vitacoach_core::HealthStore;
use vitacoach_engine::BriefingGenerator;

pub async fn run(date: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let target = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))?,
        None => Local::now().date_naive(),
    };

    let store = super::open_store(&config).await?;
    let generator = BriefingGenerator::new(
        store as Arc<dyn HealthStore>,
        super::user_profile(&config),
    );

    println!("{}", generator.generate(target).await?);
    Ok(())
}
