//! Identity domain models and the authentication state machine.
//!
//! The rest of the application only ever observes *presence* of an
//! identity; the fields carried here are provider-supplied metadata.

pub mod provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use provider::{AuthChangeHandler, IdentityProvider, Subscription};

/// Opaque proof that a principal is signed in.
///
/// Created on successful sign-in resolution or an auth-change
/// notification, destroyed on sign-out. Consumers outside the session
/// gate must not depend on any field beyond presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned principal ID.
    pub id: String,
    /// Email address, when the provider exposes one.
    #[serde(default)]
    pub email: Option<String>,
    /// Timestamp of the last sign-in, when available.
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Creates an identity with only the principal ID set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            last_sign_in_at: None,
        }
    }
}

/// Kinds of change the identity provider reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    SessionExpired,
}

/// One auth-change notification: the kind of change plus the identity
/// the provider now holds, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChangeEvent {
    pub change: AuthChange,
    pub identity: Option<Identity>,
}

impl AuthChangeEvent {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            change: AuthChange::SignedIn,
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            change: AuthChange::SignedOut,
            identity: None,
        }
    }

    pub fn session_expired() -> Self {
        Self {
            change: AuthChange::SessionExpired,
            identity: None,
        }
    }
}

/// Authentication state owned by the session gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated {
        identity: Identity,
    },
}

impl AuthState {
    /// Builds the initial state from a startup identity resolution.
    pub fn from_resolved(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => Self::Authenticated { identity },
            None => Self::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The top-level view this state selects.
    pub fn view(&self) -> View {
        match self {
            Self::Authenticated { .. } => View::Home,
            Self::Unauthenticated => View::SignIn,
        }
    }
}

/// The two top-level views the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    SignIn,
    Home,
}

/// Reducer for the authentication state machine.
///
/// Presence of an identity in the event decides the next state; the kind
/// of change and the prior state do not. A notification without an
/// identity therefore always lands in `Unauthenticated`, whatever was
/// shown before.
pub fn next_state(_current: AuthState, event: AuthChangeEvent) -> AuthState {
    match event.identity {
        Some(identity) => AuthState::Authenticated { identity },
        None => AuthState::Unauthenticated,
    }
}
