//! VitaCoach CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Create the config directory and a default config file
//! - `chat`     — Interactive coaching session
//! - `ask`      — Send a single query
//! - `briefing` — Print the morning briefing
//! - `scenario` — Run a what-if BP scenario
//! - `record`   — Enter a day's measurements by hand
//! - `alerts`   — Check for and list health alerts
//! - `history`  — Show recent conversation turns
//! - `status`   — Show configuration and backend availability

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vitacoach",
    about = "VitaCoach — personal AI health coaching assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config file
    Init,

    /// Chat with the health coach interactively
    Chat,

    /// Send a single query and print the answer
    Ask {
        /// The question to ask
        query: String,
    },

    /// Print the morning briefing
    Briefing {
        /// Briefing date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Run a what-if scenario against your baselines
    Scenario {
        /// Hypothetical VO2 max
        #[arg(long)]
        vo2: Option<f64>,

        /// Hypothetical nightly sleep hours
        #[arg(long)]
        sleep: Option<f64>,

        /// Hypothetical daily steps
        #[arg(long)]
        steps: Option<f64>,

        /// Hypothetical sleep efficiency (percent)
        #[arg(long)]
        efficiency: Option<f64>,

        /// Starting systolic BP (defaults to your 90-day average)
        #[arg(long)]
        bp: Option<f64>,
    },

    /// Record a day's measurements by hand
    Record {
        /// Date to record for (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Systolic BP (mmHg)
        #[arg(long)]
        systolic: Option<f64>,

        /// Diastolic BP (mmHg)
        #[arg(long)]
        diastolic: Option<f64>,

        /// Sleep duration (hours)
        #[arg(long)]
        sleep: Option<f64>,

        /// Sleep efficiency (percent)
        #[arg(long)]
        efficiency: Option<f64>,

        /// Step count
        #[arg(long)]
        steps: Option<i64>,

        /// VO2 max
        #[arg(long)]
        vo2: Option<f64>,

        /// Heart-rate variability (ms)
        #[arg(long)]
        hrv: Option<f64>,
    },

    /// List unacknowledged alerts
    Alerts {
        /// Run detection checks for today before listing
        #[arg(long)]
        check: bool,

        /// Acknowledge an alert by id
        #[arg(long)]
        ack: Option<i64>,
    },

    /// Show recent conversation turns
    History {
        /// Maximum turns to show
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// Show configuration and backend availability
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { query } => commands::ask::run(&query).await?,
        Commands::Briefing { date } => commands::briefing::run(date.as_deref()).await?,
        Commands::Scenario {
            vo2,
            sleep,
            steps,
            efficiency,
            bp,
        } => commands::scenario::run(vo2, sleep, steps, efficiency, bp).await?,
        Commands::Record {
            date,
            systolic,
            diastolic,
            sleep,
            efficiency,
            steps,
            vo2,
            hrv,
        } => {
            commands::record::run(
                date.as_deref(),
                commands::record::Measurements {
                    systolic,
                    diastolic,
                    sleep,
                    efficiency,
                    steps,
                    vo2,
                    hrv,
                },
            )
            .await?
        }
        Commands::Alerts { check, ack } => commands::alerts::run(check, ack).await?,
        Commands::History { limit } => commands::history::run(limit).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
