//! Command lifecycle: registration at startup, routing, removal at shutdown.
//!
//! State machine:
//! `Unregistered → Registering → Registered → Unregistering → Unregistered`.
//!
//! Registration and unregistration each run to completion under one phase
//! lock, so they never overlap. Invocations are only routed while
//! `Registered`.


use crate::commands::CommandHandler;
use crate::service::Services;
use polyglot_core::{
    command::{CommandDefinition, Invocation, RegistrationHandle, Reply},
    error::PolyglotError,
    traits::Platform,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Where the command set stands with respect to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unregistered,
    Registering,
    Registered,
    Unregistering,
}

/// Owns the command set and its remote registrations.
pub struct CommandLifecycle {
    /// Registration order.
    handlers: Vec<Arc<dyn CommandHandler>>,
    /// Exact name → handler, built once.
    routes: HashMap<String, Arc<dyn CommandHandler>>,
    state: RwLock<LifecycleState>,
    /// Successful registrations, command name → handle.
    handles: Mutex<HashMap<String, RegistrationHandle>>,
    phase: Mutex<()>,
}

impl CommandLifecycle {
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Self {
        let routes = handlers
            .iter()
            .map(|h| (h.definition().name.clone(), Arc::clone(h)))
            .collect();
        Self {
            handlers,
            routes,
            state: RwLock::new(LifecycleState::Unregistered),
            handles: Mutex::new(HashMap::new()),
            phase: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    async fn set_state(&self, state: LifecycleState) {
        *self.state.write().await = state;
    }

    pub fn definitions(&self) -> Vec<&CommandDefinition> {
        self.handlers.iter().map(|h| h.definition()).collect()
    }

    /// Handles currently tracked for cleanup.
    pub async fn handles(&self) -> Vec<RegistrationHandle> {
        self.handles.lock().await.values().cloned().collect()
    }

    /// Register every definition, one platform call each.
    ///
    /// Partial success is fine: whatever succeeded is tracked and removed at
    /// shutdown. Fails only when not a single definition could be registered.
    /// A command the platform already knows counts as registered.
    pub async fn register_all(
        &self,
        platform: &dyn Platform,
    ) -> Result<Vec<RegistrationHandle>, PolyglotError> {
        let _phase = self.phase.lock().await;
        self.set_state(LifecycleState::Registering).await;

        let mut registered = Vec::new();
        let mut failures = Vec::new();

        for handler in &self.handlers {
            let def = handler.definition();
            let handle = match platform.register_command(def).await {
                Ok(handle) => handle,
                Err(PolyglotError::AlreadyRegistered { handle }) => {
                    info!("/{} already registered as {handle}", def.name);
                    RegistrationHandle(handle)
                }
                Err(e) => {
                    warn!("failed to register /{}: {e}", def.name);
                    failures.push(format!("/{}: {e}", def.name));
                    continue;
                }
            };
            self.handles
                .lock()
                .await
                .insert(def.name.clone(), handle.clone());
            registered.push(handle);
        }

        if registered.is_empty() && !self.handlers.is_empty() {
            self.set_state(LifecycleState::Unregistered).await;
            return Err(PolyglotError::Platform(format!(
                "no commands could be registered on {}: {}",
                platform.name(),
                failures.join("; ")
            )));
        }

        info!(
            "registered {}/{} commands on {}",
            registered.len(),
            self.handlers.len(),
            platform.name()
        );
        self.set_state(LifecycleState::Registered).await;
        Ok(registered)
    }

    /// Dispatch an invocation by exact command name.
    pub async fn route(&self, services: &dyn Services, invocation: &Invocation) -> Reply {
        if self.state().await != LifecycleState::Registered {
            let lang = services.effective_language(&invocation.tenant_id).await;
            return Reply::text(services.translate(&lang, "not_ready")).ephemeral();
        }

        match self.routes.get(&invocation.command) {
            Some(handler) => handler.execute(services, invocation).await,
            None => {
                warn!("unknown command /{}", invocation.command);
                let lang = services.effective_language(&invocation.tenant_id).await;
                Reply::text(services.translate(&lang, "unknown_command")).ephemeral()
            }
        }
    }

    /// Best-effort removal of every tracked registration.
    ///
    /// Each call is bounded by `per_call_timeout`. Failures are logged and not
    /// retried. Returns how many registrations were removed.
    pub async fn unregister_all(&self, platform: &dyn Platform, per_call_timeout: Duration) -> usize {
        let _phase = self.phase.lock().await;
        self.set_state(LifecycleState::Unregistering).await;

        let handles = std::mem::take(&mut *self.handles.lock().await);
        let total = handles.len();
        let mut removed = 0;

        for (name, handle) in handles {
            match tokio::time::timeout(per_call_timeout, platform.unregister_command(&handle)).await
            {
                Ok(Ok(())) => removed += 1,
                Ok(Err(e)) => warn!("failed to unregister /{name} ({handle}): {e}"),
                Err(_) => warn!(
                    "unregistering /{name} ({handle}) timed out after {}s",
                    per_call_timeout.as_secs_f32()
                ),
            }
        }

        info!("unregistered {removed}/{total} commands from {}", platform.name());
        self.set_state(LifecycleState::Unregistered).await;
        removed
    }
}
