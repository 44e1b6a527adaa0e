//! Cross-component behavior of the session gate and the search
//! orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use dealscout_application::{SearchOrchestrator, SessionGate};
use dealscout_core::error::Result;
use dealscout_core::identity::{
    AuthChangeEvent, AuthChangeHandler, Identity, IdentityProvider, Subscription, View,
};
use dealscout_core::search::{GenerativePayload, GenerativeService, SearchField};

struct StubIdentityProvider {
    identity: Option<Identity>,
    handlers: Arc<Mutex<HashMap<u64, AuthChangeHandler>>>,
    next_handler_id: AtomicU64,
}

impl StubIdentityProvider {
    fn signed_in() -> Arc<Self> {
        Arc::new(Self {
            identity: Some(Identity::new("u-1")),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_handler_id: AtomicU64::new(0),
        })
    }

    fn emit(&self, event: AuthChangeEvent) {
        let handlers: Vec<AuthChangeHandler> =
            self.handlers.lock().unwrap().values().cloned().collect();
        for handler in handlers {
            handler(event.clone());
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        Ok(self.identity.clone())
    }

    fn subscribe(&self, handler: AuthChangeHandler) -> Subscription {
        let id = self.next_handler_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().unwrap().insert(id, handler);
        let registry = self.handlers.clone();
        Subscription::new(move || {
            registry.lock().unwrap().remove(&id);
        })
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Identity> {
        unimplemented!("not exercised here")
    }

    async fn sign_out(&self) -> Result<()> {
        self.emit(AuthChangeEvent::signed_out());
        Ok(())
    }
}

struct SlowGenerativeService {
    delay: Duration,
    response: Value,
}

#[async_trait]
impl GenerativeService for SlowGenerativeService {
    async fn request(&self, _kind: &str, _payload: GenerativePayload) -> Result<Value> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn sign_out_mid_search_switches_view_without_cancelling() {
    let provider = StubIdentityProvider::signed_in();
    let gate = SessionGate::new(provider.clone());
    gate.start().await;
    assert_eq!(gate.view(), View::Home);

    let service = Arc::new(SlowGenerativeService {
        delay: Duration::from_millis(50),
        response: json!([{ "company_name": "Acme Health" }]),
    });
    let orchestrator = Arc::new(SearchOrchestrator::new(service));
    orchestrator.update_field(SearchField::Industry, "Healthcare");

    let background = orchestrator.clone();
    let search = tokio::spawn(async move { background.submit_search().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(orchestrator.lifecycle().is_in_flight());

    // Sign out while the search is pending: the view switches at once...
    gate.sign_out().await.unwrap();
    assert_eq!(gate.view(), View::SignIn);

    // ...and the in-flight search still runs to its terminal state.
    search.await.unwrap();
    assert!(orchestrator.lifecycle().is_terminal());
    assert_eq!(orchestrator.results().len(), 1);
    assert_eq!(orchestrator.results()[0].company_name, "Acme Health");

    gate.shutdown();
}

#[tokio::test]
async fn orchestrator_state_is_independent_of_auth_state() {
    let provider = StubIdentityProvider::signed_in();
    let gate = SessionGate::new(provider.clone());
    gate.start().await;

    let service = Arc::new(SlowGenerativeService {
        delay: Duration::ZERO,
        response: json!([]),
    });
    let orchestrator = SearchOrchestrator::new(service);
    orchestrator.update_field(SearchField::Location, "Texas");

    provider.emit(AuthChangeEvent::signed_out());
    assert_eq!(gate.view(), View::SignIn);

    // Criteria survive a sign-out; only the view is gated.
    assert_eq!(orchestrator.criteria().location, "Texas");
}
