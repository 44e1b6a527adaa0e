//! GenerativeApiClient - REST implementation of the generative service.
//!
//! Dispatches event requests to the backend's event endpoint and hands
//! back the structured result untouched. Interpretation of the payload
//! is the caller's job; this client only guarantees "JSON or an error".

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dealscout_core::error::{Result, ScoutError};
use dealscout_core::search::{GenerativePayload, GenerativeService};

use crate::config::GenerativeSettings;

/// Generative service backed by the backend's `/v1/events` endpoint.
pub struct GenerativeApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GenerativeApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &GenerativeSettings) -> Self {
        Self::new(settings.url.clone(), settings.api_key.clone())
    }
}

#[async_trait]
impl GenerativeService for GenerativeApiClient {
    async fn request(&self, kind: &str, payload: GenerativePayload) -> Result<Value> {
        let body = EventRequest {
            event_type: kind,
            data: payload,
        };

        let response = self
            .client
            .post(format!("{}/v1/events", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ScoutError::transport(format!("event request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, body));
        }

        let value: Value = response.json().await.map_err(|err| {
            ScoutError::malformed_response(format!("event response is not JSON: {err}"))
        })?;

        Ok(extract_result(value))
    }
}

#[derive(Serialize)]
struct EventRequest<'a> {
    event_type: &'a str,
    data: GenerativePayload,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Unwraps the `data` envelope when the backend uses one; older
/// deployments return the result bare.
fn extract_result(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key("data") => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn map_http_error(status: StatusCode, body: String) -> ScoutError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    ScoutError::api(Some(status.as_u16()), message)
}
