use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::EngineSettings;
use crate::error::EngineError;

use super::{Command, CommandGateway};

/// Gateway speaking JSON over HTTP: `POST {base_url}/invoke/{command}` with the
/// command's arguments as the request body.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(settings: &EngineSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(super) fn endpoint(&self, command: &str) -> String {
        format!("{}/invoke/{}", self.base_url, command)
    }
}

#[async_trait]
impl CommandGateway for HttpGateway {
    async fn invoke(&self, command: Command) -> Result<Value, EngineError> {
        let name = command.name();
        let response = self
            .client
            .post(self.endpoint(name))
            .json(&command.args())
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(format!("{name}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::Unavailable(format!("{name}: {e}")))?;

        if !status.is_success() {
            debug!(command = name, %status, "engine rejected command");
            return Err(EngineError::Rejected {
                command: name,
                message: rejection_message(status, &body),
            });
        }

        parse_body(name, &body)
    }
}

/// Decode a successful response body. An empty body is an acknowledgement.
pub(super) fn parse_body(command: &'static str, body: &str) -> Result<Value, EngineError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| EngineError::Unavailable(format!("{command}: malformed response: {e}")))
}

/// Extract the engine's reason from an error body: `{"error": "..."}`, a bare
/// JSON string, plain text, or the HTTP reason phrase as a last resort.
pub(super) fn rejection_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value {
            Value::String(s) if !s.is_empty() => return s,
            Value::Object(map) => {
                if let Some(Value::String(s)) = map.get("error") {
                    return s.clone();
                }
            }
            _ => {}
        }
    } else if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
