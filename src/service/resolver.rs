//! Effective-language resolution: guild override → platform locale → default.

use crate::i18n::Catalog;
use polyglot_core::traits::Platform;
use polyglot_settings::GuildSettingsStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Platform locale tokens we have catalogs for.
const PLATFORM_LOCALES: &[(&str, &str)] = &[
    ("en", "en"),
    ("en-US", "en"),
    ("en-GB", "en"),
    ("ru", "ru"),
];

/// Map a platform locale token to a supported language code.
pub fn map_platform_locale(locale: &str) -> Option<&'static str> {
    PLATFORM_LOCALES
        .iter()
        .find_map(|(token, code)| (*token == locale).then_some(*code))
}

/// Resolves the language a guild should be answered in.
pub struct LanguageResolver {
    catalog: Arc<Catalog>,
    store: Arc<GuildSettingsStore>,
    platform: Arc<dyn Platform>,
}

impl LanguageResolver {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<GuildSettingsStore>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            catalog,
            store,
            platform,
        }
    }

    /// First match wins:
    /// 1. the guild's stored override,
    /// 2. the guild's platform locale (unknown locales map to the default),
    /// 3. the configured default.
    ///
    /// Never fails. An empty tenant skips the first two tiers.
    pub async fn resolve(&self, tenant_id: &str) -> String {
        let default = self.catalog.default_lang();
        if tenant_id.is_empty() {
            return default.to_string();
        }

        if let Some(lang) = self.store.get(tenant_id).await {
            if self.catalog.supports(&lang) {
                return lang;
            }
            warn!("guild {tenant_id} has unsupported stored language '{lang}', ignoring");
        }

        match self.platform.preferred_locale(tenant_id).await {
            Ok(Some(locale)) => {
                return map_platform_locale(&locale)
                    .filter(|code| self.catalog.supports(code))
                    .unwrap_or(default)
                    .to_string();
            }
            Ok(None) => {}
            Err(e) => debug!("preferred locale lookup failed for guild {tenant_id}: {e}"),
        }

        default.to_string()
    }
}
