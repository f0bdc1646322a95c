//! Gateway: the main event loop connecting the platform to the command set.
//!
//! Startup registers every command before the first invocation is routed.
//! Each invocation runs on its own task. Shutdown stops routing, lets
//! in-flight invocations finish (bounded), then removes the registrations.

#[cfg(test)]
mod tests;

use crate::lifecycle::CommandLifecycle;
use crate::service::Services;
use polyglot_core::{
    command::{Invocation, Reply},
    traits::Platform,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The central gateway that routes invocations from the platform to handlers.
pub struct Gateway {
    platform: Arc<dyn Platform>,
    services: Arc<dyn Services>,
    lifecycle: Arc<CommandLifecycle>,
    /// Bounds both the in-flight drain and each unregister call.
    shutdown_timeout: Duration,
}

impl Gateway {
    pub fn new(
        platform: Arc<dyn Platform>,
        services: Arc<dyn Services>,
        lifecycle: Arc<CommandLifecycle>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            platform,
            services,
            lifecycle,
            shutdown_timeout,
        }
    }

    /// Run until `shutdown` resolves or the platform's event stream ends.
    pub async fn run(self: Arc<Self>, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let commands = self
            .lifecycle
            .definitions()
            .iter()
            .map(|d| format!("/{}", d.name))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "Polyglot gateway running | platform: {} | commands: {commands} | default language: {}",
            self.platform.name(),
            self.services.default_language(),
        );

        let mut rx = self
            .platform
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start platform {}: {e}", self.platform.name()))?;

        if let Err(e) = self.lifecycle.register_all(self.platform.as_ref()).await {
            if let Err(stop_err) = self.platform.stop().await {
                warn!("failed to stop platform: {stop_err}");
            }
            anyhow::bail!("{e}");
        }

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
                incoming = rx.recv() => match incoming {
                    Some(invocation) => {
                        let gw = self.clone();
                        tasks.spawn(async move {
                            gw.dispatch(invocation).await;
                        });
                    }
                    None => {
                        warn!("platform event stream closed");
                        break;
                    }
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Stop accepting events before commands disappear. Whatever is
        // already queued still gets its one reply.
        rx.close();
        let mut refused = 0;
        while let Ok(invocation) = rx.try_recv() {
            self.refuse(&invocation).await;
            refused += 1;
        }
        if refused > 0 {
            info!("answered {refused} queued invocations with not_ready");
        }
        self.shutdown(tasks).await;
        Ok(())
    }

    /// Route one invocation and send its reply.
    async fn dispatch(&self, invocation: Invocation) {
        let reply = self
            .lifecycle
            .route(self.services.as_ref(), &invocation)
            .await;
        if let Err(e) = self.platform.respond(&invocation, reply).await {
            error!("failed to respond to /{}: {e}", invocation.command);
        }
    }

    /// Answer an invocation that arrived too late to be routed.
    async fn refuse(&self, invocation: &Invocation) {
        let lang = self
            .services
            .effective_language(&invocation.tenant_id)
            .await;
        let reply = Reply::text(self.services.translate(&lang, "not_ready")).ephemeral();
        if let Err(e) = self.platform.respond(invocation, reply).await {
            error!("failed to respond to /{}: {e}", invocation.command);
        }
    }

    /// Graceful shutdown: drain in-flight invocations, unregister, stop.
    async fn shutdown(&self, mut tasks: JoinSet<()>) {
        info!("Shutting down...");

        let in_flight = tasks.len();
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(self.shutdown_timeout, drain).await.is_err() {
            warn!("{in_flight} invocations still running after shutdown timeout, aborting");
            tasks.abort_all();
        }

        self.lifecycle
            .unregister_all(self.platform.as_ref(), self.shutdown_timeout)
            .await;

        if let Err(e) = self.platform.stop().await {
            warn!("failed to stop platform {}: {e}", self.platform.name());
        }

        info!("Shutdown complete.");
    }
}
