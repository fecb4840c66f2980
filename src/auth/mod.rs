//! Identity provider abstraction.
//!
//! The survey never talks to an OAuth vendor directly. It sees an
//! [`IdentityProvider`] that can sign a user in or out, and a
//! [`AuthSubscription`] that reports the signed-in identity whenever it
//! changes.

pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::AuthError;

pub use local::LocalIdentityProvider;

/// The signed-in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque provider id, only used as a foreign key on stored records.
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Backend-agnostic identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider tag, e.g. "google".
    fn name(&self) -> &str;

    /// Start a sign-in and wait for the provider to answer.
    async fn sign_in(&self) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to identity changes.
    fn subscribe(&self) -> AuthSubscription;
}

/// Handle on the provider's current-user feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: watch::Receiver<Option<Identity>>,
}

impl AuthSubscription {
    pub fn new(rx: watch::Receiver<Option<Identity>>) -> Self {
        Self { rx }
    }

    /// The identity right now, marking it as seen.
    pub fn current(&mut self) -> Option<Identity> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change. Returns `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<Identity>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
