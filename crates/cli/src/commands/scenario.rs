//! `vitacoach scenario` — What-if analysis against stored baselines.

use std::collections::HashMap;
use std::sync::Arc;
use vitacoach_config::AppConfig;
use vitacoach_core::HealthStore;
use vitacoach_engine::scenario::format_result;
use vitacoach_engine::ScenarioEngine;

pub async fn run(
    vo2: Option<f64>,
    sleep: Option<f64>,
    steps: Option<f64>,
    efficiency: Option<f64>,
    bp: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut changes = HashMap::new();
    if let Some(v) = vo2 {
        changes.insert("vo2_max".to_string(), v);
    }
    if let Some(v) = sleep {
        changes.insert("sleep_hours".to_string(), v);
    }
    if let Some(v) = steps {
        changes.insert("steps".to_string(), v);
    }
    if let Some(v) = efficiency {
        changes.insert("sleep_efficiency_pct".to_string(), v);
    }

    if changes.is_empty() {
        return Err(
            "No hypothetical values given. Try e.g. `vitacoach scenario --vo2 42 --sleep 7.5`"
                .into(),
        );
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = super::open_store(&config).await?;

    let engine = ScenarioEngine::new(store as Arc<dyn HealthStore>);
    let result = engine.run_from(&changes, bp).await?;

    println!();
    print!("{}", format_result(&result));
    println!();

    Ok(())
}
