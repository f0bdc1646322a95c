//! Service facade: the only surface command handlers see.
//!
//! Handlers take `&dyn Services`, never the platform session, so they can be
//! exercised against a fake in tests.

mod resolver;


pub use resolver::{map_platform_locale, LanguageResolver};

use crate::i18n::Catalog;
use async_trait::async_trait;
use polyglot_core::{error::PolyglotError, traits::Platform};
use polyglot_settings::GuildSettingsStore;
use std::sync::Arc;

/// Capabilities available to command handlers.
#[async_trait]
pub trait Services: Send + Sync {
    /// Language to answer a guild in.
    async fn effective_language(&self, tenant_id: &str) -> String;

    /// Localized string; never fails.
    fn translate(&self, lang: &str, key: &str) -> String;

    /// Localized string with positional arguments.
    fn render(&self, lang: &str, key: &str, args: &[&str]) -> String;

    /// Persist a guild language override.
    async fn set_language(&self, tenant_id: &str, lang: &str) -> Result<(), PolyglotError>;

    /// Remove a guild override. Returns whether one existed.
    async fn clear_language(&self, tenant_id: &str) -> Result<bool, PolyglotError>;

    /// The stored override, if any.
    async fn stored_language(&self, tenant_id: &str) -> Option<String>;

    /// Supported language codes, sorted.
    fn supported_languages(&self) -> Vec<String>;

    /// Display name of a language in that language.
    fn language_name(&self, lang: &str) -> String;

    /// Process-wide fallback language.
    fn default_language(&self) -> String;
}

/// Production facade over the catalog, the settings store and the platform.
pub struct Kernel {
    catalog: Arc<Catalog>,
    store: Arc<GuildSettingsStore>,
    resolver: LanguageResolver,
}

impl Kernel {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<GuildSettingsStore>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        let resolver = LanguageResolver::new(catalog.clone(), store.clone(), platform);
        Self {
            catalog,
            store,
            resolver,
        }
    }

    fn guild(tenant_id: &str) -> Result<&str, PolyglotError> {
        if tenant_id.is_empty() {
            Err(PolyglotError::GuildOnly)
        } else {
            Ok(tenant_id)
        }
    }
}

#[async_trait]
impl Services for Kernel {
    async fn effective_language(&self, tenant_id: &str) -> String {
        self.resolver.resolve(tenant_id).await
    }

    fn translate(&self, lang: &str, key: &str) -> String {
        self.catalog.lookup(lang, key).to_string()
    }

    fn render(&self, lang: &str, key: &str, args: &[&str]) -> String {
        self.catalog.render(lang, key, args)
    }

    async fn set_language(&self, tenant_id: &str, lang: &str) -> Result<(), PolyglotError> {
        let guild = Self::guild(tenant_id)?;
        if !self.catalog.supports(lang) {
            return Err(PolyglotError::UnsupportedLanguage(lang.to_string()));
        }
        self.store.set(guild, lang).await
    }

    async fn clear_language(&self, tenant_id: &str) -> Result<bool, PolyglotError> {
        let guild = Self::guild(tenant_id)?;
        self.store.remove(guild).await
    }

    async fn stored_language(&self, tenant_id: &str) -> Option<String> {
        if tenant_id.is_empty() {
            return None;
        }
        self.store.get(tenant_id).await
    }

    fn supported_languages(&self) -> Vec<String> {
        self.catalog
            .languages()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn language_name(&self, lang: &str) -> String {
        self.catalog.language_name(lang).to_string()
    }

    fn default_language(&self) -> String {
        self.catalog.default_lang().to_string()
    }
}
