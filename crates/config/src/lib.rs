//! Configuration loading, validation, and management for VitaCoach.
//!
//! Loads configuration from `~/.vitacoach/config.toml` with environment
//! variable overrides for API keys. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vitacoach/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User profile and health goals
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Per-backend model settings
    #[serde(default)]
    pub models: ModelsConfig,

    /// Router behavior
    #[serde(default)]
    pub router: RouterConfig,

    /// Storage paths
    #[serde(default)]
    pub store: StoreConfig,
}

/// User profile and goal targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_name")]
    pub name: String,

    /// Target systolic blood pressure (mmHg)
    #[serde(default = "default_bp_goal")]
    pub bp_goal: f64,

    /// Target nightly sleep (hours)
    #[serde(default = "default_sleep_goal")]
    pub sleep_goal: f64,

    /// Target daily step count
    #[serde(default = "default_steps_goal")]
    pub steps_goal: f64,

    /// Target VO2 max (ml/kg/min)
    #[serde(default = "default_vo2_goal")]
    pub vo2_max_goal: f64,
}

fn default_name() -> String {
    "there".into()
}
fn default_bp_goal() -> f64 {
    130.0
}
fn default_sleep_goal() -> f64 {
    7.0
}
fn default_steps_goal() -> f64 {
    10_000.0
}
fn default_vo2_goal() -> f64 {
    43.0
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            bp_goal: default_bp_goal(),
            sleep_goal: default_sleep_goal(),
            steps_goal: default_steps_goal(),
            vo2_max_goal: default_vo2_goal(),
        }
    }
}

/// Per-backend model configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ModelsConfig {
    pub primary: BackendConfig,
    pub secondary: BackendConfig,
    pub local: LocalConfig,
}

// Deserialized by hand so each slot resolves its own model default. A
// partially specified `[models.secondary]` table must keep the secondary
// model name, not inherit the primary one.
impl<'de> Deserialize<'de> for ModelsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct Raw {
            primary: RawBackend,
            secondary: RawBackend,
            local: LocalConfig,
        }

        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct RawBackend {
            model: Option<String>,
            api_key: Option<String>,
            api_url: Option<String>,
            max_tokens: Option<u32>,
        }

        impl RawBackend {
            fn resolve(self, default_model: fn() -> String) -> BackendConfig {
                BackendConfig {
                    model: self.model.unwrap_or_else(default_model),
                    api_key: self.api_key,
                    api_url: self.api_url,
                    max_tokens: self.max_tokens.unwrap_or_else(default_max_tokens),
                }
            }
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            primary: raw.primary.resolve(default_primary_model),
            secondary: raw.secondary.resolve(default_secondary_model),
            local: raw.local,
        })
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: BackendConfig {
                model: default_primary_model(),
                api_key: None,
                api_url: None,
                max_tokens: default_max_tokens(),
            },
            secondary: BackendConfig {
                model: default_secondary_model(),
                api_key: None,
                api_url: None,
                max_tokens: default_max_tokens(),
            },
            local: LocalConfig::default(),
        }
    }
}

/// Settings for one remote backend.
#[derive(Clone, Serialize)]
pub struct BackendConfig {
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    pub max_tokens: u32,
}

fn default_primary_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_secondary_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_primary_model(),
            api_key: None,
            api_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Settings for the local subprocess backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_local_model")]
    pub model: String,

    /// Per-call timeout for the subprocess (seconds)
    #[serde(default = "default_local_timeout")]
    pub timeout_secs: u64,
}

fn default_local_model() -> String {
    "llama3".into()
}
fn default_local_timeout() -> u64 {
    120
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model: default_local_model(),
            timeout_secs: default_local_timeout(),
        }
    }
}

/// Router behavior flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Prefer the local model for medium-complexity queries to save cost.
    #[serde(default = "default_true")]
    pub cost_mode: bool,

    /// Remote request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cost_mode: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Defaults to `~/.vitacoach/health.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: None }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vitacoach/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `ANTHROPIC_API_KEY` for the primary backend
    /// - `OPENAI_API_KEY` for the secondary backend
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.models.primary.api_key.is_none() {
            config.models.primary.api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
        if config.models.secondary.api_key.is_none() {
            config.models.secondary.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        if let Ok(model) = std::env::var("VITACOACH_LOCAL_MODEL") {
            config.models.local.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vitacoach")
    }

    /// Resolve the database path, applying the default when unset.
    pub fn db_path(&self) -> PathBuf {
        match &self.store.db_path {
            Some(p) => PathBuf::from(p),
            None => Self::config_dir().join("health.db"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.profile.bp_goal <= 0.0 {
            return Err(ConfigError::ValidationError(
                "profile.bp_goal must be positive".into(),
            ));
        }
        if self.profile.sleep_goal <= 0.0 || self.profile.sleep_goal > 24.0 {
            return Err(ConfigError::ValidationError(
                "profile.sleep_goal must be between 0 and 24 hours".into(),
            ));
        }
        if self.models.primary.max_tokens == 0 || self.models.secondary.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `status` output hints).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            models: ModelsConfig::default(),
            router: RouterConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.profile.bp_goal, 130.0);
        assert_eq!(config.models.local.model, "llama3");
        assert!(config.router.cost_mode);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.profile.name, config.profile.name);
        assert_eq!(parsed.models.secondary.model, config.models.secondary.model);
    }

    #[test]
    fn invalid_sleep_goal_rejected() {
        let config = AppConfig {
            profile: ProfileConfig {
                sleep_goal: 30.0,
                ..ProfileConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().profile.bp_goal, 130.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[profile]
name = "Alex"
bp_goal = 125.0

[router]
cost_mode = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.profile.name, "Alex");
        assert_eq!(config.profile.bp_goal, 125.0);
        assert_eq!(config.profile.sleep_goal, 7.0);
        assert!(!config.router.cost_mode);
        assert_eq!(config.models.primary.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn partial_secondary_keeps_its_own_model() {
        let toml_str = r#"
[models.secondary]
api_key = "sk-test"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.secondary.model, "gpt-4o-mini");
        assert_eq!(config.models.secondary.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.models.primary.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn api_key_redacted_in_debug() {
        let backend = BackendConfig {
            api_key: Some("sk-secret".into()),
            ..BackendConfig::default()
        };
        let debug = format!("{backend:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama3"));
        assert!(toml_str.contains("cost_mode"));
    }
}
