//! In-memory session registry, one session per user.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::channels::UserId;

use super::state::Session;

/// Sessions keyed by user. Holding a user's session lock serializes that
/// user's events; different users proceed independently.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the user's session, creating a fresh one at the main menu.
    pub async fn session(&self, user_id: UserId) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.read().await.get(&user_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(user_id).or_insert_with(|| {
            debug!(user_id = %user_id, "Creating session");
            Arc::new(Mutex::new(Session::new(user_id)))
        });
        Arc::clone(entry)
    }

    /// Copy of the user's current session, if one exists.
    pub async fn snapshot(&self, user_id: UserId) -> Option<Session> {
        let handle = self.sessions.read().await.get(&user_id).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Whether `handle` is still the registered session for `user_id`.
    pub async fn is_current(&self, user_id: UserId, handle: &Arc<Mutex<Session>>) -> bool {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    /// Drop the user's session if `handle` is still the registered one.
    ///
    /// Call with `handle` locked. A caller that cloned the handle earlier
    /// sees `is_current` turn false once it gets the lock.
    pub async fn remove(&self, user_id: UserId, handle: &Arc<Mutex<Session>>) -> bool {
        let mut sessions = self.sessions.write().await;
        if !sessions
            .get(&user_id)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
        {
            return false;
        }
        sessions.remove(&user_id);
        debug!(user_id = %user_id, remaining = sessions.len(), "Removed session");
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
