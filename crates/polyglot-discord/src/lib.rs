//! # polyglot-discord
//!
//! Discord platform integration: REST calls for command registration,
//! interaction responses and guild lookups, plus a gateway reader that turns
//! `INTERACTION_CREATE` events into invocations.
//! Docs: <https://discord.com/developers/docs/interactions/application-commands>

pub(crate) mod gateway;
mod rest;
pub(crate) mod types;

#[cfg(test)]
mod tests;

use polyglot_core::config::DiscordConfig;
use tokio::sync::{watch, OnceCell};

/// Discord platform session.
pub struct DiscordPlatform {
    config: DiscordConfig,
    client: reqwest::Client,
    /// Resolved lazily from the API unless configured.
    application_id: OnceCell<String>,
    /// Flipped to `true` by `stop()`; the gateway task watches it.
    shutdown: watch::Sender<bool>,
}

impl DiscordPlatform {
    /// Create a new Discord platform from config.
    pub fn new(config: DiscordConfig) -> Self {
        let application_id = if config.application_id.is_empty() {
            OnceCell::new()
        } else {
            OnceCell::new_with(Some(config.application_id.clone()))
        };
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            client: reqwest::Client::new(),
            application_id,
            shutdown,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.token)
    }
}
