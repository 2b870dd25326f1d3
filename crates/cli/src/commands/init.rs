//! `vitacoach init` — First-time setup.

use vitacoach_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🩺 VitaCoach — First-Time Setup");
    println!("================================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created default config: {}", config_path.display());
    } else {
        println!("  Config file exists: {}", config_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Edit {} with your name and goals", config_path.display());
    println!("  2. export ANTHROPIC_API_KEY='sk-ant-...'");
    println!("  3. Optionally: export OPENAI_API_KEY and install ollama for local routing");
    println!("  4. Run `vitacoach status` to verify, then `vitacoach chat`");
    println!();

    Ok(())
}
