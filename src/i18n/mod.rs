//! Internationalization: translation catalogs loaded from disk.
//!
//! One file per language in the locale directory, named `<code>.<ext>` where
//! `<ext>` is one of `yml`, `yaml`, `toml` or `json`. Each file is a flat
//! key → template map. Templates use positional placeholders: `{0}`, `{1}`, …
//!
//! Lookup falls back from the requested language to the default language and
//! finally to the key itself, so a missing translation never fails a reply.

mod format;


pub use format::render_template;

use polyglot_core::error::PolyglotError;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Recognised catalog file extensions.
const EXTENSIONS: &[&str] = &["yml", "yaml", "toml", "json"];

/// Key holding a language's own display name (e.g. "Русский").
pub const LANGUAGE_NAME_KEY: &str = "language_name";

type Messages = HashMap<String, String>;

/// Immutable set of translation catalogs.
#[derive(Debug)]
pub struct Catalog {
    default_lang: String,
    langs: HashMap<String, Messages>,
}

impl Catalog {
    /// Load every catalog file in `dir`.
    ///
    /// Any unreadable or malformed catalog fails the whole load, as does a
    /// missing catalog for `default_lang`.
    pub fn load(dir: &Path, default_lang: &str) -> Result<Self, PolyglotError> {
        let mut langs = HashMap::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !EXTENSIONS.contains(&ext) {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = std::fs::read_to_string(&path)?;
            let messages = parse(ext, &content).map_err(|e| {
                PolyglotError::Parse(format!("invalid catalog {}: {e}", path.display()))
            })?;
            info!("loaded catalog '{code}' ({} keys)", messages.len());
            langs.insert(code.to_string(), messages);
        }

        Self::from_maps(default_lang, langs)
    }

    /// Build a catalog from in-memory maps.
    pub fn from_maps(
        default_lang: &str,
        langs: HashMap<String, Messages>,
    ) -> Result<Self, PolyglotError> {
        if !langs.contains_key(default_lang) {
            return Err(PolyglotError::Config(format!(
                "no catalog for default language '{default_lang}'"
            )));
        }
        Ok(Self {
            default_lang: default_lang.to_string(),
            langs,
        })
    }

    /// Return the template for `key` in `lang`.
    /// Falls back to the default language, then to `key` itself.
    pub fn lookup<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        self.langs
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.langs.get(&self.default_lang).and_then(|m| m.get(key)))
            .map_or(key, String::as_str)
    }

    /// Look up `key` and substitute positional arguments.
    pub fn render(&self, lang: &str, key: &str, args: &[&str]) -> String {
        render_template(self.lookup(lang, key), args)
    }

    /// Loaded language codes, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.langs.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.langs.contains_key(lang)
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Display name of a language in that language, or the code itself.
    /// Never falls back to another catalog.
    pub fn language_name<'a>(&'a self, lang: &'a str) -> &'a str {
        self.langs
            .get(lang)
            .and_then(|m| m.get(LANGUAGE_NAME_KEY))
            .map_or(lang, String::as_str)
    }
}

fn parse(ext: &str, content: &str) -> Result<Messages, String> {
    match ext {
        "yml" | "yaml" => {
            if content.trim().is_empty() {
                return Ok(Messages::new());
            }
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        }
        "toml" => toml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        other => Err(format!("unsupported extension '{other}'")),
    }
}
