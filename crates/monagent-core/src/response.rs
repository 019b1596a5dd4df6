//! Response envelope returned by the agent's query surface.
//!
//! Every answer has the same shape:
//!
//! ```json
//! {
//!   "successful": true,
//!   "timestamp": "2024-05-01T10:00:00Z",
//!   "durationMs": 3,
//!   "status": 200,
//!   "traceId": "…",
//!   "server": "db1",
//!   "data": { "contents": [ … ] }
//! }
//! ```
//!
//! On failure `data` is absent and `error` carries the code and message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorCode, PluginError};

/// What a successful answer carries. Chosen by the caller, never guessed.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl Payload {
    /// Serializes every item of `items` into a sequence payload.
    pub fn sequence<T: Serialize>(items: &[T]) -> serde_json::Result<Self> {
        items
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()
            .map(Payload::Sequence)
    }

    fn into_data(self) -> Option<Value> {
        match self {
            Payload::Empty => None,
            Payload::Scalar(value) => Some(value),
            Payload::Sequence(items) => Some(serde_json::json!({ "contents": items })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub sub_errors: Vec<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub successful: bool,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: u16,
    pub trace_id: String,
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl AgentResponse {
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_duration(mut self, duration: std::time::Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }
}

/// Builds the envelope for `payload`, or for `err` when one is given.
///
/// A [`PluginError`] keeps its own code and status; any other error is
/// reported as unexpected with its display text.
pub fn build_response(
    payload: Payload,
    err: Option<&(dyn std::error::Error + 'static)>,
) -> AgentResponse {
    let base = AgentResponse {
        successful: true,
        timestamp: Utc::now(),
        duration_ms: 0,
        status: 200,
        trace_id: String::new(),
        server: String::new(),
        data: None,
        error: None,
    };

    match err {
        None => AgentResponse {
            data: payload.into_data(),
            ..base
        },
        Some(err) => {
            let (code, message) = match err.downcast_ref::<PluginError>() {
                Some(plugin_err) => (plugin_err.code(), plugin_err.to_string()),
                None => (ErrorCode::UNEXPECTED, err.to_string()),
            };
            AgentResponse {
                successful: false,
                status: code.status,
                error: Some(ApiError {
                    code: code.code,
                    message,
                    sub_errors: Vec::new(),
                }),
                ..base
            }
        }
    }
}
