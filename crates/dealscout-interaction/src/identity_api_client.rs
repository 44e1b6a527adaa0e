//! IdentityApiClient - REST implementation of the identity provider.
//!
//! Talks to a GoTrue-compatible auth endpoint. The client holds the
//! access token for the current session and emits auth-change
//! notifications to its subscribers after sign-in and sign-out; handlers
//! are invoked synchronously, one at a time, in subscription order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use dealscout_core::error::{Result, ScoutError};
use dealscout_core::identity::{
    AuthChangeEvent, AuthChangeHandler, Identity, IdentityProvider, Subscription,
};

use crate::config::IdentitySettings;

type HandlerRegistry = Arc<Mutex<BTreeMap<u64, AuthChangeHandler>>>;

/// Identity provider backed by a GoTrue-style REST API.
pub struct IdentityApiClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    handlers: HandlerRegistry,
    next_handler_id: AtomicU64,
}

impl IdentityApiClient {
    /// Creates a client with no active session.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
            handlers: Arc::new(Mutex::new(BTreeMap::new())),
            next_handler_id: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &IdentitySettings) -> Self {
        Self::new(settings.url.clone(), settings.anon_key.clone())
    }

    /// Resumes an existing session token, e.g. one restored by the host.
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        *self.access_token.write().unwrap() = Some(token.into());
        self
    }

    fn access_token(&self) -> Option<String> {
        self.access_token.read().unwrap().clone()
    }

    fn notify(&self, event: AuthChangeEvent) {
        let handlers: Vec<AuthChangeHandler> =
            self.handlers.lock().unwrap().values().cloned().collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    async fn fetch_user(&self, token: &str) -> Result<Option<Identity>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| ScoutError::transport(format!("identity request failed: {err}")))?;

        match response.status() {
            status if status.is_success() => {
                let identity: Identity = response.json().await.map_err(|err| {
                    ScoutError::malformed_response(format!("unreadable user payload: {err}"))
                })?;
                Ok(Some(identity))
            }
            // An expired or revoked token means "no identity", not an error.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(map_http_error(status, body))
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityApiClient {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        let identity = self.fetch_user(&token).await?;
        if identity.is_none() {
            // The token no longer maps to a principal; forget it.
            *self.access_token.write().unwrap() = None;
        }
        Ok(identity)
    }

    fn subscribe(&self, handler: AuthChangeHandler) -> Subscription {
        let id = self.next_handler_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().unwrap().insert(id, handler);

        let registry = self.handlers.clone();
        Subscription::new(move || {
            registry.lock().unwrap().remove(&id);
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let response = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| ScoutError::transport(format!("sign-in request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, body));
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            ScoutError::malformed_response(format!("unreadable token payload: {err}"))
        })?;

        *self.access_token.write().unwrap() = Some(token.access_token);
        self.notify(AuthChangeEvent::signed_in(token.user.clone()));
        Ok(token.user)
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.access_token();

        let outcome = match token {
            Some(token) => {
                let result = self
                    .client
                    .post(format!("{}/auth/v1/logout", self.base_url))
                    .header("apikey", &self.anon_key)
                    .bearer_auth(&token)
                    .send()
                    .await;
                match result {
                    Ok(response) if response.status().is_success() => Ok(()),
                    Ok(response) => {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        Err(map_http_error(status, body))
                    }
                    Err(err) => Err(ScoutError::transport(format!(
                        "sign-out request failed: {err}"
                    ))),
                }
            }
            None => Ok(()),
        };

        // The session is gone from the client's perspective either way:
        // drop the token and notify before reporting the outcome.
        if let Err(ref err) = outcome {
            tracing::warn!(error = %err, "sign-out request failed; clearing local session anyway");
        }
        *self.access_token.write().unwrap() = None;
        self.notify(AuthChangeEvent::signed_out());
        outcome
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Identity,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn map_http_error(status: StatusCode, body: String) -> ScoutError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.error_description.or(parsed.msg).or(parsed.message))
        .unwrap_or(body);
    ScoutError::api(Some(status.as_u16()), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_token_resolves_to_no_identity_without_network() {
        // base_url is never contacted when there is no token.
        let client = IdentityApiClient::new("http://127.0.0.1:1", "anon");
        let identity = client.current_identity().await.unwrap();
        assert!(identity.is_none());
    }

    #[test]
    fn test_subscription_release_removes_handler() {
        let client = IdentityApiClient::new("http://127.0.0.1:1", "anon");

        let mut first = client.subscribe(Arc::new(|_| {}));
        let _second = client.subscribe(Arc::new(|_| {}));
        assert_eq!(client.handlers.lock().unwrap().len(), 2);

        first.unsubscribe();
        assert_eq!(client.handlers.lock().unwrap().len(), 1);

        // Releasing again changes nothing.
        first.unsubscribe();
        assert_eq!(client.handlers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_notify_reaches_handlers_in_subscription_order() {
        let client = IdentityApiClient::new("http://127.0.0.1:1", "anon");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first_seen = seen.clone();
        let _first = client.subscribe(Arc::new(move |_| {
            first_seen.lock().unwrap().push("first");
        }));
        let second_seen = seen.clone();
        let _second = client.subscribe(Arc::new(move |_| {
            second_seen.lock().unwrap().push("second");
        }));

        client.notify(AuthChangeEvent::signed_out());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_map_http_error_prefers_structured_message() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.into(),
        );
        assert!(err.to_string().contains("Invalid login credentials"));

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream exploded".into());
        assert!(err.to_string().contains("upstream exploded"));
    }
}
