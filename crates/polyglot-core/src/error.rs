use thiserror::Error;

/// Top-level error type for Polyglot.
#[derive(Debug, Error)]
pub enum PolyglotError {
    /// I/O error (a missing optional file is never reported as one).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed catalog or settings content.
    #[error("parse error: {0}")]
    Parse(String),

    /// Disk write failed after the in-memory state was already updated.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Remote call against the messaging platform failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// The platform already knows a command with this name.
    #[error("command already registered ({handle})")]
    AlreadyRegistered { handle: String },

    /// Language code outside the loaded catalog set.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Operation needs a guild but was invoked from a direct message.
    #[error("this operation is only available inside a guild")]
    GuildOnly,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
