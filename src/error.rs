//! Error types for Marquee

use thiserror::Error;

/// Result type alias for Marquee operations
pub type Result<T> = std::result::Result<T, MarqueeError>;

/// Main error type for Marquee
#[derive(Error, Debug)]
pub enum MarqueeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend call timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarqueeError {
    /// Fatal errors terminate the process at startup; everything else is
    /// recovered at the layer where it originated.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MarqueeError::Config(_))
    }

    /// Wrap a reqwest failure, distinguishing timeouts from other transport
    /// errors so callers can surface them as a separate kind.
    pub fn from_request(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MarqueeError::Timeout(format!("{context}: {err}"))
        } else {
            MarqueeError::Http(err)
        }
    }
}
