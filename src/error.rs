// Error types for hubbub.
// Handles GitHub API errors, storage errors, and widget configuration errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubbubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Widget has no gist identifier in attribute `{0}`")]
    MissingGistId(String),

    #[error("Invalid gist id `{0}`")]
    InvalidGistId(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HubbubError>;
