//! Top-level error types for gluebot.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether the error should stop the process instead of triggering a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Auth(AuthError::MissingToken { .. }))
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variables: set GLUEBOT_USERNAME and GLUEBOT_PASSWORD")]
    MissingCredentials,

    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: Box<toml::de::Error>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Login and session errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login response did not set the {cookie} cookie")]
    MissingToken { cookie: &'static str },

    #[error("login rejected with status {status}")]
    Rejected { status: u16 },
}

/// Errors from the external renderer subprocess.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to spawn renderer {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("renderer timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("renderer printed no output path")]
    EmptyOutput,
}
