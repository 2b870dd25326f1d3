//! `vitacoach status` — Show configuration and backend availability.

use std::time::Duration;
use vitacoach_backends::OllamaBackend;
use vitacoach_config::AppConfig;
use vitacoach_core::ModelBackend;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🩺 VitaCoach Status");
    println!("===================");
    println!("  Config dir:  {}", AppConfig::config_dir().display());
    println!("  Database:    {}", config.db_path().display());
    println!("  Profile:     {}", config.profile.name);
    println!(
        "  Goals:       BP <{:.0} mmHg · sleep {} h · {:.0} steps · VO2 {}",
        config.profile.bp_goal,
        config.profile.sleep_goal,
        config.profile.steps_goal,
        config.profile.vo2_max_goal
    );
    println!("  Primary:     {}", config.models.primary.model);
    println!("  Secondary:   {}", config.models.secondary.model);
    println!("  Local:       {}", config.models.local.model);
    println!(
        "  Cost mode:   {}",
        if config.router.cost_mode { "on" } else { "off" }
    );

    println!();
    println!(
        "  Primary key:   {}",
        if config.models.primary.api_key.is_some() {
            "✅ configured"
        } else {
            "⚠️  missing (set ANTHROPIC_API_KEY)"
        }
    );
    println!(
        "  Secondary key: {}",
        if config.models.secondary.api_key.is_some() {
            "✅ configured"
        } else {
            "—  not set (secondary routes to primary)"
        }
    );

    let local = OllamaBackend::new(
        &config.models.local.model,
        Duration::from_secs(config.models.local.timeout_secs),
    );
    println!(
        "  Local model:   {}",
        if local.is_available().await {
            "✅ available"
        } else {
            "⚠️  not found (local routes fall back to primary)"
        }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!();
        println!("  ✅ Config file found");
    } else {
        println!();
        println!("  ⚠️  No config file — run `vitacoach init` first");
    }

    Ok(())
}
