//! Live survey sessions, keyed by session id.
//!
//! Sessions are forgotten once they go quiet: a background sweep closes
//! any session untouched for the configured idle timeout, and finished
//! sessions after a short grace period that leaves time to read the receipt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::LocalIdentityProvider;
use crate::config::SurveyConfig;
use crate::store::SurveyStore;

use super::session::SurveySession;

/// How often the idle sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How long a submitted session stays readable before it is evicted.
pub const SUBMITTED_GRACE: Duration = Duration::from_secs(5 * 60);

/// A session together with the provider its sign-ins are staged on.
pub struct SessionEntry {
    pub session: SurveySession,
    pub identity: Arc<LocalIdentityProvider>,
    last_active: Mutex<Instant>,
}

impl SessionEntry {
    fn touch(&self) {
        if let Ok(mut last) = self.last_active.lock() {
            *last = Instant::now();
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        self.last_active
            .lock()
            .map(|last| now.saturating_duration_since(*last))
            .unwrap_or_default()
    }
}

/// Holds every open session of the service.
pub struct SessionRegistry {
    config: SurveyConfig,
    store: Arc<dyn SurveyStore>,
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new(config: SurveyConfig, store: Arc<dyn SurveyStore>) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Open a fresh session with its own identity provider.
    pub async fn create(&self) -> Arc<SessionEntry> {
        let identity = Arc::new(LocalIdentityProvider::new(self.config.auth_provider.clone()));
        let session = SurveySession::start(
            self.config.clone(),
            identity.clone(),
            Arc::clone(&self.store),
        );
        let id = session.id();
        let entry = Arc::new(SessionEntry {
            session,
            identity,
            last_active: Mutex::new(Instant::now()),
        });
        self.sessions.write().await.insert(id, Arc::clone(&entry));
        entry
    }

    /// Look up a session and mark it as active.
    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionEntry>> {
        let entry = self.sessions.read().await.get(&id).cloned()?;
        entry.touch();
        Some(entry)
    }

    /// Close and forget a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(entry) => {
                entry.session.close();
                info!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close every session that has expired. Returns how many were evicted.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    async fn sweep_at(&self, now: Instant) -> usize {
        let snapshot: Vec<(Uuid, Arc<SessionEntry>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(entry)))
            .collect();

        let mut expired = Vec::new();
        for (id, entry) in snapshot {
            let limit = if entry.session.current_step().await.is_terminal() {
                SUBMITTED_GRACE.min(self.config.session_idle_timeout)
            } else {
                self.config.session_idle_timeout
            };
            if entry.idle_for(now) >= limit {
                expired.push(id);
            }
        }

        let mut evicted = 0;
        {
            let mut sessions = self.sessions.write().await;
            for id in expired {
                if let Some(entry) = sessions.remove(&id) {
                    entry.session.close();
                    debug!(session_id = %id, "Session expired");
                    evicted += 1;
                }
            }
        }
        evicted
    }

    /// Spawn the periodic idle sweep.
    pub fn spawn_sweeper(registry: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Session sweep started (interval: {}s)", interval.as_secs());
            let mut ticker = tokio::time::interval(interval);
            // Skip immediate first tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let evicted = registry.sweep().await;
                if evicted > 0 {
                    let open = registry.len().await;
                    info!(evicted, open, "Expired sessions closed");
                }
            }
        })
    }
}
