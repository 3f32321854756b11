use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColabError {
    #[error("no installation at {0}: run 'colab install'")]
    NotInstalled(String),

    #[error("bot not found: {0}")]
    BotNotFound(String),

    #[error("bot already exists: {0}")]
    BotExists(String),

    #[error("invalid bot name '{0}': use letters, digits, '_' or '-'")]
    InvalidBotName(String),

    #[error("invalid project slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid role '{0}': expected supervisor, manager, worker, grunt or bot")]
    InvalidRole(String),

    #[error("access denied: {manager} cannot manage {target} (insufficient rank)")]
    PermissionDenied { manager: String, target: String },

    #[error("malformed {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("service not configured: set COLAB_URL and COLAB_ANON_KEY or write {0}")]
    ServiceNotConfigured(String),

    #[error("home directory not found: set HOME or pass --home")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ColabError>;
