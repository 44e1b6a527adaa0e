//! Identity provider contract.
//!
//! The provider is an external collaborator: it resolves the current
//! identity, notifies on change, and terminates sessions. Notification
//! delivery is ordered and handlers run one at a time to completion.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthChangeEvent, Identity};
use crate::error::Result;

/// Callback invoked for every auth-change notification.
pub type AuthChangeHandler = Arc<dyn Fn(AuthChangeEvent) + Send + Sync>;

/// Service that yields a current-user identity or none, and notifies on
/// change.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the identity the provider currently holds, if any.
    async fn current_identity(&self) -> Result<Option<Identity>>;

    /// Registers a handler for auth-change notifications.
    ///
    /// The returned [`Subscription`] must be released when the consumer
    /// is torn down, so the provider never invokes a handler against a
    /// destroyed view.
    fn subscribe(&self, handler: AuthChangeHandler) -> Subscription;

    /// Provider-side sign-in surface.
    ///
    /// A successful sign-in also produces a `SignedIn` notification on
    /// every live subscription; callers should react through that path
    /// rather than the returned identity.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    /// Requests termination of the current session.
    ///
    /// The local state change arrives as a `SignedOut` notification, not
    /// as a direct effect of this call.
    async fn sign_out(&self) -> Result<()>;
}

/// Scoped release handle for an auth-change subscription.
///
/// `unsubscribe` releases exactly once; further calls are safe no-ops.
/// Dropping the handle releases as a backstop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps the provider-supplied release action.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that releases nothing. Useful for providers that
    /// never notify.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Releases the subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the subscription still holds its release action.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_unsubscribe_releases_exactly_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());

        // Drop after an explicit release must not fire again.
        drop(sub);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_subscription() {
        let mut sub = Subscription::noop();
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
