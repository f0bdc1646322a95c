//! In-process fakes shared by the unit tests.

use async_trait::async_trait;
use polyglot_core::{
    command::{CommandDefinition, Invocation, RegistrationHandle, Reply},
    error::PolyglotError,
    traits::Platform,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh temporary directory (unique per call).
pub fn test_dir(prefix: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "__polyglot_{prefix}_{}_{}__",
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Scriptable platform that records every call.
#[derive(Default)]
pub struct FakePlatform {
    /// Commands currently registered remotely, name → handle.
    pub registered: Mutex<HashMap<String, RegistrationHandle>>,
    /// Number of register calls made.
    pub register_calls: AtomicU64,
    /// Names whose registration fails.
    pub fail_register: Mutex<HashSet<String>>,
    /// Names reported as already registered instead of upserted.
    pub report_duplicates: bool,
    /// Handles whose removal fails.
    pub fail_unregister: Mutex<HashSet<String>>,
    /// Handles whose removal never completes.
    pub hang_unregister: Mutex<HashSet<String>>,
    /// Guild → platform preferred locale.
    pub locales: Mutex<HashMap<String, String>>,
    pub fail_locale_lookup: bool,
    pub fail_respond: bool,
    /// Replies sent, in order.
    pub replies: Mutex<Vec<(Invocation, Reply)>>,
    /// Invocations already waiting in the event stream when `start()` returns.
    pub queued: Vec<Invocation>,
    /// Sender side of the event stream handed out by `start()`.
    pub events: Mutex<Option<mpsc::Sender<Invocation>>>,
    pub stopped: Mutex<bool>,
}

impl FakePlatform {
    pub fn with_locale(tenant_id: &str, locale: &str) -> Self {
        let platform = Self::default();
        platform
            .locales
            .lock()
            .unwrap()
            .insert(tenant_id.to_string(), locale.to_string());
        platform
    }

    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn replies(&self) -> Vec<(Invocation, Reply)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Invocation>, PolyglotError> {
        let (tx, rx) = mpsc::channel(16);
        for invocation in &self.queued {
            let _ = tx.try_send(invocation.clone());
        }
        *self.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn register_command(
        &self,
        definition: &CommandDefinition,
    ) -> Result<RegistrationHandle, PolyglotError> {
        self.register_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_register.lock().unwrap().contains(&definition.name) {
            return Err(PolyglotError::Platform(format!(
                "cannot register {}",
                definition.name
            )));
        }
        let mut registered = self.registered.lock().unwrap();
        if let Some(existing) = registered.get(&definition.name) {
            if self.report_duplicates {
                return Err(PolyglotError::AlreadyRegistered {
                    handle: existing.0.clone(),
                });
            }
            return Ok(existing.clone());
        }
        let handle = RegistrationHandle(format!("id-{}", definition.name));
        registered.insert(definition.name.clone(), handle.clone());
        Ok(handle)
    }

    async fn unregister_command(&self, handle: &RegistrationHandle) -> Result<(), PolyglotError> {
        let hang = self.hang_unregister.lock().unwrap().contains(&handle.0);
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_unregister.lock().unwrap().contains(&handle.0) {
            return Err(PolyglotError::Platform(format!("cannot remove {handle}")));
        }
        self.registered
            .lock()
            .unwrap()
            .retain(|_, h| h != handle);
        Ok(())
    }

    async fn respond(&self, invocation: &Invocation, reply: Reply) -> Result<(), PolyglotError> {
        if self.fail_respond {
            return Err(PolyglotError::Platform("respond failed".to_string()));
        }
        self.replies
            .lock()
            .unwrap()
            .push((invocation.clone(), reply));
        Ok(())
    }

    async fn preferred_locale(&self, tenant_id: &str) -> Result<Option<String>, PolyglotError> {
        if self.fail_locale_lookup {
            return Err(PolyglotError::Platform("guild lookup failed".to_string()));
        }
        Ok(self.locales.lock().unwrap().get(tenant_id).cloned())
    }

    async fn stop(&self) -> Result<(), PolyglotError> {
        *self.stopped.lock().unwrap() = true;
        self.events.lock().unwrap().take();
        Ok(())
    }
}

/// Invocation of `command` from `tenant_id` with no options.
pub fn invocation(command: &str, tenant_id: &str) -> Invocation {
    Invocation {
        id: format!("inv-{command}"),
        token: "token".to_string(),
        command: command.to_string(),
        tenant_id: tenant_id.to_string(),
        user_id: "u1".to_string(),
        ..Default::default()
    }
}
