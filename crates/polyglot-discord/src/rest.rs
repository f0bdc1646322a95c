//! REST calls and the Platform trait implementation.

use super::types::{command_payload, reply_payload, DcApplication, DcCreatedCommand, DcGuild};
use super::DiscordPlatform;
use async_trait::async_trait;
use polyglot_core::{
    command::{CommandDefinition, Invocation, RegistrationHandle, Reply},
    error::PolyglotError,
    traits::Platform,
};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, info};

fn platform_err(what: &str, e: impl std::fmt::Display) -> PolyglotError {
    PolyglotError::Platform(format!("{what}: {e}"))
}

impl DiscordPlatform {
    /// Application id from config, or `GET /applications/@me` once.
    async fn application_id(&self) -> Result<&str, PolyglotError> {
        let id = self
            .application_id
            .get_or_try_init(|| async {
                let app: DcApplication = self.get_json("/applications/@me").await?;
                info!("discord application id resolved: {}", app.id);
                Ok::<_, PolyglotError>(app.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PolyglotError> {
        let url = format!("{}{path}", self.config.api_base);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| platform_err("request failed", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PolyglotError::Platform(format!("GET {path} → {status}: {body}")));
        }
        resp.json()
            .await
            .map_err(|e| platform_err("invalid response body", e))
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Invocation>, PolyglotError> {
        if self.config.token.is_empty() {
            return Err(PolyglotError::Config(
                "discord token is empty. Set it in config.toml or DISCORD_TOKEN env var."
                    .to_string(),
            ));
        }
        Ok(self.spawn_gateway())
    }

    async fn register_command(
        &self,
        definition: &CommandDefinition,
    ) -> Result<RegistrationHandle, PolyglotError> {
        let app_id = self.application_id().await?;
        let url = format!("{}/applications/{app_id}/commands", self.config.api_base);

        // Creating a command with an existing name overwrites it and returns
        // the existing id, so re-registration after a crash is not an error.
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&command_payload(definition))
            .send()
            .await
            .map_err(|e| platform_err("register request failed", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PolyglotError::Platform(format!(
                "register /{} → {status}: {body}",
                definition.name
            )));
        }

        let created: DcCreatedCommand = resp
            .json()
            .await
            .map_err(|e| platform_err("invalid register response", e))?;
        debug!("registered /{} as {}", definition.name, created.id);
        Ok(RegistrationHandle(created.id))
    }

    async fn unregister_command(&self, handle: &RegistrationHandle) -> Result<(), PolyglotError> {
        let app_id = self.application_id().await?;
        let url = format!(
            "{}/applications/{app_id}/commands/{handle}",
            self.config.api_base
        );
        let resp = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| platform_err("unregister request failed", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(PolyglotError::Platform(format!(
                "unregister {handle} → {status}: {body}"
            )))
        }
    }

    async fn respond(&self, invocation: &Invocation, reply: Reply) -> Result<(), PolyglotError> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.config.api_base, invocation.id, invocation.token
        );
        let resp = self
            .client
            .post(&url)
            .json(&reply_payload(&reply))
            .send()
            .await
            .map_err(|e| platform_err("respond request failed", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(PolyglotError::Platform(format!(
                "respond to /{} → {status}: {body}",
                invocation.command
            )))
        }
    }

    async fn preferred_locale(&self, tenant_id: &str) -> Result<Option<String>, PolyglotError> {
        let guild: DcGuild = self.get_json(&format!("/guilds/{tenant_id}")).await?;
        Ok(guild.preferred_locale.filter(|l| !l.is_empty()))
    }

    async fn stop(&self) -> Result<(), PolyglotError> {
        info!("Discord platform stopping");
        self.shutdown.send_replace(true);
        Ok(())
    }
}
