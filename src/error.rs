//! Error types for the engine gateway and the terminal runtime.

use thiserror::Error;

/// Failure of a single command sent to the playback engine or the indexer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The call itself could not complete (connection refused, timeout,
    /// unreadable response).
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered but refused the request (bad seek position,
    /// unreadable file, unknown folder...).
    #[error("{command} rejected: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
}

impl EngineError {
    /// Short human-readable reason, used for status-line notices.
    pub fn reason(&self) -> &str {
        match self {
            EngineError::Unavailable(msg) => msg,
            EngineError::Rejected { message, .. } => message,
        }
    }
}

/// Errors that end the terminal session.
#[derive(Debug, Error)]
pub enum AppError {
    /// Terminal I/O errors (raw mode, drawing, input stream).
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP gateway could not be constructed.
    #[error("gateway setup failed: {0}")]
    Gateway(#[from] reqwest::Error),

    /// Settings could not be rendered for `--print-config`.
    #[error("could not render settings: {0}")]
    Render(#[from] toml::ser::Error),
}
