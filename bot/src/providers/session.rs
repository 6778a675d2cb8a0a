//! Session store trait.

use crate::error::StoreResult;
use crate::session::Session;
use crate::types::UserId;
use chrono::Duration;

/// Volatile per-user session storage.
///
/// # Implementation Notes
///
/// - Sessions expire after `ttl` without a write (sliding expiry: every
///   `set` restarts the clock)
/// - An expired session is indistinguishable from one that never existed
/// - Last write wins; there is no versioning
pub trait SessionStore: Send + Sync {
    /// Load the session for a user.
    ///
    /// # Returns
    ///
    /// `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable or the record is corrupt.
    fn get(&self, user_id: UserId) -> impl std::future::Future<Output = StoreResult<Option<Session>>> + Send;

    /// Save the session, replacing any previous one and resetting its lifetime.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable or the session cannot be encoded.
    fn set(&self, session: &Session, ttl: Duration) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Remove the session. Removing an absent session is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn delete(&self, user_id: UserId) -> impl std::future::Future<Output = StoreResult<()>> + Send;
}
