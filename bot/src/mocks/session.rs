//! Mock session store for testing.

use crate::error::{StoreError, StoreResult};
use crate::providers::SessionStore;
use crate::session::Session;
use crate::types::UserId;
use chrono::{DateTime, Duration, Utc};
use courier_core::environment::Clock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Entries = HashMap<UserId, (Session, DateTime<Utc>)>;

/// In-memory session store with clock-driven expiry.
///
/// Expiry is evaluated against the injected clock on read, so tests can
/// advance a `ManualClock` past the TTL instead of sleeping.
#[derive(Clone)]
pub struct InMemorySessionStore {
    clock: Arc<dyn Clock>,
    sessions: Arc<Mutex<Entries>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySessionStore {
    /// Create an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate an outage: every call fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Get count of live sessions (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        Ok(lock(&self.sessions)?
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count())
    }

    /// Whether a live session exists for `user_id` (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn contains(&self, user_id: UserId) -> StoreResult<bool> {
        let now = self.clock.now();
        Ok(lock(&self.sessions)?
            .get(&user_id)
            .is_some_and(|(_, expires_at)| *expires_at > now))
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("session store unavailable".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.sessions)
            .field("unavailable", &self.unavailable)
            .finish_non_exhaustive()
    }
}

fn lock(sessions: &Mutex<Entries>) -> StoreResult<std::sync::MutexGuard<'_, Entries>> {
    sessions
        .lock()
        .map_err(|_| StoreError::Connection("Mutex lock failed".to_string()))
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: UserId) -> impl Future<Output = StoreResult<Option<Session>>> + Send {
        let result = self.check_available().and_then(|()| {
            let now = self.clock.now();
            let mut sessions = lock(&self.sessions)?;
            let live = match sessions.get(&user_id) {
                Some((session, expires_at)) if *expires_at > now => Some(session.clone()),
                _ => None,
            };
            if live.is_none() {
                sessions.remove(&user_id);
            }
            Ok(live)
        });

        async move { result }
    }

    fn set(&self, session: &Session, ttl: Duration) -> impl Future<Output = StoreResult<()>> + Send {
        let result = self.check_available().and_then(|()| {
            let expires_at = self.clock.now() + ttl;
            lock(&self.sessions)?.insert(session.user_id, (session.clone(), expires_at));
            Ok(())
        });

        async move { result }
    }

    fn delete(&self, user_id: UserId) -> impl Future<Output = StoreResult<()>> + Send {
        let result = self.check_available().and_then(|()| {
            lock(&self.sessions)?.remove(&user_id);
            Ok(())
        });

        async move { result }
    }
}
