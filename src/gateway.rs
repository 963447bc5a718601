//! Command gateway: the single request/response channel to the external
//! playback engine and indexer.
//!
//! Every other component talks to the engine through [`Engine`], a typed
//! wrapper over a [`CommandGateway`] implementation. The gateway owns no state
//! and never retries; calls may complete in any order.

mod command;
mod engine;
mod http;

pub use command::Command;
pub use engine::Engine;
pub use http::HttpGateway;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

#[cfg(test)]
pub mod fake;

#[cfg(test)]
mod tests;

/// Transport-agnostic engine channel.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Send `command` and wait for the engine's JSON response.
    async fn invoke(&self, command: Command) -> Result<Value, EngineError>;
}
