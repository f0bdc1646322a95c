mod defaults;


use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PolyglotError;
use defaults::*;

/// Environment variable consulted when the config carries no token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Top-level Polyglot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    /// File the config was read from; `None` when defaults were used.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Directory holding `settings.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory holding one catalog file per language.
    #[serde(default = "default_locale_dir")]
    pub locale_dir: String,
    /// Process-wide fallback language.
    #[serde(default = "default_lang")]
    pub default_lang: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound for each remote call made while shutting down.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            locale_dir: default_locale_dir(),
            default_lang: default_lang(),
            log_level: default_log_level(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl BotConfig {
    /// Location of the persisted guild settings.
    pub fn settings_path(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("settings.json")
    }

    /// Catalog directory with `~` expanded.
    pub fn locale_path(&self) -> PathBuf {
        PathBuf::from(shellexpand(&self.locale_dir))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Discord connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Empty = read from `DISCORD_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// Application id. Empty = discovered from the API at startup.
    #[serde(default)]
    pub application_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            application_id: String::new(),
            api_base: default_api_base(),
            gateway_url: default_gateway_url(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist; `source` tells the two
/// apart so the caller can report it once logging is up. An empty token is
/// filled from the `DISCORD_TOKEN` environment variable.
pub fn load(path: &str) -> Result<Config, PolyglotError> {
    let mut config = parse_file(path)?;
    if config.discord.token.is_empty() {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.discord.token = token;
        }
    }
    validate(&config)?;
    Ok(config)
}

fn parse_file(path: &str) -> Result<Config, PolyglotError> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| PolyglotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| PolyglotError::Config(format!("failed to parse config: {}", e)))?;
    config.source = Some(path.to_path_buf());
    Ok(config)
}

fn validate(config: &Config) -> Result<(), PolyglotError> {
    if config.bot.default_lang.trim().is_empty() {
        return Err(PolyglotError::Config(
            "bot.default_lang must not be empty".to_string(),
        ));
    }
    Ok(())
}
