use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no API key found for {name} (checked: {checked})")]
    NoApiKey { name: String, checked: String },

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("not connected: call connect() first")]
    NotConnected,

    #[error("{endpoint} rejected the request ({status}): {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("checkpoint '{name}' blocked: {}", .blockers.join("; "))]
    CheckpointBlocked { name: String, blockers: Vec<String> },

    #[error("no instance record for {0}")]
    InstanceNotFound(String),

    #[error("no keystore configured: build the client with_home()")]
    NoKeystore,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] colab_core::ColabError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
