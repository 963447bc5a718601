//! User-visible, non-fatal error messages.
//!
//! Optimistic intents push a [`Notice`] when the engine refuses them; the
//! event loop shows the latest one in the status line until it expires.

use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// Sending half of the notice channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notices {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Log `message` and queue it for display.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        // Receiver gone means the UI is shutting down; nothing left to show.
        let _ = self.tx.send(Notice { message });
    }
}
