//! Command implementations plus the shared wiring that turns an `AppConfig`
//! into live stores, backends, and the conversation manager.

pub mod alerts;
pub mod ask;
pub mod briefing;
pub mod chat;
pub mod history;
pub mod init;
pub mod record;
pub mod scenario;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use vitacoach_backends::{AnthropicBackend, OllamaBackend, OpenAiBackend};
use vitacoach_config::AppConfig;
use vitacoach_core::error::BackendError;
use vitacoach_core::{HealthStore, ModelBackend, SemanticIndex, UserProfile};
use vitacoach_engine::{ContextRetriever, ConversationManager, ModelRouter};
use vitacoach_store::{SqliteStore, SummaryIndex};

type CliError = Box<dyn std::error::Error>;

pub(crate) fn user_profile(config: &AppConfig) -> UserProfile {
    UserProfile {
        name: config.profile.name.clone(),
        bp_goal: config.profile.bp_goal,
        sleep_goal: config.profile.sleep_goal,
        steps_goal: config.profile.steps_goal as i64,
        vo2_max_goal: config.profile.vo2_max_goal,
    }
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<SqliteStore>, CliError> {
    let path = config.db_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(Arc::new(SqliteStore::new(&path.to_string_lossy()).await?))
}

pub(crate) async fn open_index(config: &AppConfig) -> Result<Arc<SummaryIndex>, CliError> {
    let path = config.db_path();
    Ok(Arc::new(SummaryIndex::new(&path.to_string_lossy()).await?))
}

/// Build the three-slot router. The primary slot is required; secondary and
/// local degrade gracefully when not configured.
pub(crate) fn build_router(config: &AppConfig) -> Result<ModelRouter, CliError> {
    let timeout = Duration::from_secs(config.router.request_timeout_secs);

    let primary = match AnthropicBackend::new(
        config.models.primary.api_key.clone(),
        &config.models.primary.model,
        timeout,
    ) {
        Ok(b) => {
            let mut b = b.with_max_tokens(config.models.primary.max_tokens);
            if let Some(url) = &config.models.primary.api_url {
                b = b.with_base_url(url);
            }
            Arc::new(b) as Arc<dyn ModelBackend>
        }
        Err(BackendError::NotConfigured(_)) => {
            eprintln!();
            eprintln!("  ERROR: No primary API key configured!");
            eprintln!();
            eprintln!("  Set the environment variable:");
            eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!(
                "    {}",
                AppConfig::config_dir().join("config.toml").display()
            );
            eprintln!();
            return Err("No primary API key found. See above for setup instructions.".into());
        }
        Err(e) => return Err(e.into()),
    };

    let secondary = match OpenAiBackend::new(
        config.models.secondary.api_key.clone(),
        &config.models.secondary.model,
        timeout,
    ) {
        Ok(b) => {
            let mut b = b.with_max_tokens(config.models.secondary.max_tokens);
            if let Some(url) = &config.models.secondary.api_url {
                b = b.with_base_url(url);
            }
            Some(Arc::new(b) as Arc<dyn ModelBackend>)
        }
        Err(BackendError::NotConfigured(_)) => {
            tracing::debug!("Secondary backend not configured, routing to primary instead");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let local = Some(Arc::new(OllamaBackend::new(
        &config.models.local.model,
        Duration::from_secs(config.models.local.timeout_secs),
    )) as Arc<dyn ModelBackend>);

    Ok(ModelRouter::new(
        primary,
        secondary,
        local,
        config.router.cost_mode,
    ))
}

/// Everything `chat` and `ask` need, wired together.
pub(crate) async fn build_manager(config: &AppConfig) -> Result<ConversationManager, CliError> {
    let store = open_store(config).await?;
    let index = open_index(config).await?;
    let profile = user_profile(config);

    let retriever = ContextRetriever::new(
        Arc::clone(&store) as Arc<dyn HealthStore>,
        index as Arc<dyn SemanticIndex>,
        profile.clone(),
    );
    let router = build_router(config)?;

    Ok(ConversationManager::new(
        retriever,
        router,
        store as Arc<dyn HealthStore>,
        profile,
    ))
}
