//! Generative service contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Event kind the backend routes to its chat-completion handler.
pub const CHAT_REQUEST_KIND: &str = "chatgpt_request";

/// Shape the caller expects the service to honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Json,
}

/// Payload for one generative request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerativePayload {
    pub prompt: String,
    pub response_type: ResponseType,
}

impl GenerativePayload {
    /// A payload requesting a structured (parseable) response.
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_type: ResponseType::Json,
        }
    }
}

/// External system that turns a text prompt into structured data.
///
/// Treated as a black-box fallible async function: the service is
/// trusted to honor `response_type`, but callers must treat any
/// non-conforming response as a failure rather than crash.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Dispatches one request and returns the raw structured response.
    async fn request(&self, kind: &str, payload: GenerativePayload) -> Result<serde_json::Value>;
}
