//! In-process identity provider.
//!
//! An upstream login proxy (or a test) stages the credentials it verified;
//! `sign_in` then publishes them to every subscriber.

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use super::{AuthSubscription, Identity, IdentityProvider};
use crate::error::AuthError;

pub struct LocalIdentityProvider {
    name: String,
    staged: Mutex<Option<Identity>>,
    tx: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            name: name.into(),
            staged: Mutex::new(None),
            tx,
        }
    }

    /// Stage credentials for the next `sign_in`.
    pub async fn stage(&self, identity: Identity) {
        debug!(uid = %identity.uid, "Staged identity");
        *self.staged.lock().await = Some(identity);
    }

    /// The identity currently published to subscribers.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sign_in(&self) -> Result<Identity, AuthError> {
        let identity = self
            .staged
            .lock()
            .await
            .clone()
            .ok_or(AuthError::NoCredentials)?;
        info!(uid = %identity.uid, provider = %self.name, "Signed in");
        self.tx.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.staged.lock().await.take();
        if self.tx.send_replace(None).is_some() {
            info!(provider = %self.name, "Signed out");
        }
        Ok(())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.tx.subscribe())
    }
}
