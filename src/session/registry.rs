//! Per-browser workspaces.
//!
//! Each browser is identified by an opaque client id (carried in a cookie by
//! the server) and owns exactly one [`SessionStore`]. Stores are never shared
//! between clients.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::SessionStore;

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A client's store. The lock is held for a whole request, so one client's
/// requests run one at a time.
pub type SharedStore = Arc<Mutex<SessionStore>>;

#[derive(Debug)]
struct Workspace {
    store: SharedStore,
    last_activity: DateTime<Utc>,
}

impl Workspace {
    fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(SessionStore::init())),
            last_activity: Utc::now(),
        }
    }

    fn is_idle(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        // Negative duration means clock skew; treat as active.
        (now - self.last_activity)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// A request still holds a handle to the store.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.store) > 1
    }
}

/// Thread-safe registry of client workspaces.
#[derive(Debug, Clone, Default)]
pub struct Workspaces {
    inner: Arc<RwLock<HashMap<String, Workspace>>>,
}

impl Workspaces {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a client's store and mark it active.
    #[must_use]
    pub fn open(&self, client_id: &str) -> Option<SharedStore> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.get_mut(client_id).map(|ws| {
            ws.last_activity = Utc::now();
            Arc::clone(&ws.store)
        })
    }

    /// Open the store for `client_id`, or mint a new client with a fresh store.
    ///
    /// Unknown ids are not adopted; the caller gets a new id back and must
    /// hand it to the client.
    pub fn open_or_create(&self, client_id: Option<&str>) -> (String, SharedStore) {
        if let Some(id) = client_id
            && let Some(store) = self.open(id)
        {
            return (id.to_string(), store);
        }

        let id = Uuid::new_v4().to_string();
        let workspace = Workspace::new();
        let store = Arc::clone(&workspace.store);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), workspace);

        tracing::debug!(name: "workspace.created", client = %id, "Created client workspace");
        (id, store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove workspaces idle longer than `timeout` that no request is using.
    ///
    /// Returns the number of workspaces removed.
    pub fn prune_idle(&self, timeout: Duration) -> usize {
        let now = Utc::now();
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, ws| ws.in_use() || !ws.is_idle(timeout, now));
        before - guard.len()
    }
}
