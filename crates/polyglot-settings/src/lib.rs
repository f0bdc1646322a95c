//! # polyglot-settings
//!
//! Per-guild language overrides, kept in memory and mirrored to one JSON file.
//!
//! Lock discipline: a single `RwLock` guards the record. Readers share it.
//! A writer holds it exclusively across the in-memory mutation *and* the flush,
//! so writes are serialized and the file always matches some completed write.
//! The flush goes to a sibling temporary file, synced to disk, that is then
//! renamed over the target.


use polyglot_core::error::PolyglotError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Tenant id → language code.
pub type SettingsRecord = HashMap<String, String>;

/// Concurrency-safe, file-backed guild settings.
pub struct GuildSettingsStore {
    path: PathBuf,
    record: RwLock<SettingsRecord>,
}

impl GuildSettingsStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. An unreadable or malformed file
    /// is an error: previously saved preferences are never discarded silently.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PolyglotError> {
        let path = path.into();
        let record = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => {
                warn!(
                    "settings file {} exists but is empty, starting with no overrides",
                    path.display()
                );
                SettingsRecord::new()
            }
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                PolyglotError::Parse(format!("invalid settings file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no settings file at {}, starting empty", path.display());
                SettingsRecord::new()
            }
            Err(e) => return Err(PolyglotError::Io(e)),
        };

        info!(
            "Guild settings loaded from {} ({} guilds)",
            path.display(),
            record.len()
        );

        Ok(Self {
            path,
            record: RwLock::new(record),
        })
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current override for a guild.
    pub async fn get(&self, tenant_id: &str) -> Option<String> {
        self.record.read().await.get(tenant_id).cloned()
    }

    /// Store an override and flush the full record.
    ///
    /// On `Err(Persistence)` the new value is still visible to readers; it just
    /// may not survive a restart.
    pub async fn set(&self, tenant_id: &str, lang: &str) -> Result<(), PolyglotError> {
        let mut record = self.record.write().await;
        record.insert(tenant_id.to_string(), lang.to_string());
        debug!("guild {tenant_id} language set to {lang}");
        self.flush(&record).await
    }

    /// Drop an override. Returns whether one existed.
    pub async fn remove(&self, tenant_id: &str) -> Result<bool, PolyglotError> {
        let mut record = self.record.write().await;
        if record.remove(tenant_id).is_none() {
            return Ok(false);
        }
        self.flush(&record).await?;
        Ok(true)
    }

    /// Copy of the whole record.
    pub async fn snapshot(&self) -> SettingsRecord {
        self.record.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.record.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.record.read().await.is_empty()
    }

    /// Write the record to a temporary sibling, then rename it into place.
    async fn flush(&self, record: &SettingsRecord) -> Result<(), PolyglotError> {
        let persistence = |what: &str, e: std::io::Error| {
            warn!("failed to {what} {}: {e}", self.path.display());
            PolyglotError::Persistence(format!("failed to {what} {}: {e}", self.path.display()))
        };

        let bytes = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence("create directory for", e))?;
        }

        // The temporary file must be on disk before it replaces the target.
        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| persistence("create", e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| persistence("write", e))?;
        file.sync_all()
            .await
            .map_err(|e| persistence("sync", e))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| persistence("replace", e))?;
        self.sync_parent().await;
        Ok(())
    }

    /// Make the rename itself durable. Not every platform can open a
    /// directory, so failure here is only logged.
    async fn sync_parent(&self) {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };
        let synced = match tokio::fs::File::open(parent).await {
            Ok(dir) => dir.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = synced {
            debug!("could not sync directory {}: {e}", parent.display());
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
