//! Redis-based session store implementation.
//!
//! # Architecture
//!
//! Sessions are stored in Redis with:
//! - **Key**: `user_state:{user_id}` → JSON-serialized [`Session`]
//! - **TTL**: set on every write (sliding idle expiry)
//!
//! Expiry is left to Redis; an expired key simply reads as absent.
//!
//! # Example
//!
//! ```no_run
//! use courier_bot::stores::RedisSessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisSessionStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{StoreError, StoreResult};
use crate::providers::SessionStore;
use crate::session::Session;
use crate::types::UserId;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Redis-based session store with TTL-based expiration.
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> StoreResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Connection(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self::from_manager(conn_manager))
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub const fn from_manager(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    /// Get the Redis key for a user's session.
    fn session_key(user_id: UserId) -> String {
        format!("user_state:{user_id}")
    }
}

/// Redis rejects `SET EX 0`; anything shorter than a second is rounded up.
fn ttl_seconds(ttl: Duration) -> u64 {
    u64::try_from(ttl.num_seconds()).unwrap_or(0).max(1)
}

impl SessionStore for RedisSessionStore {
    async fn get(&self, user_id: UserId) -> StoreResult<Option<Session>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(user_id);

        let payload: Option<String> = conn.get(&key).await?;
        let Some(payload) = payload else {
            tracing::debug!(user_id = %user_id, "No session in Redis");
            return Ok(None);
        };

        let session: Session = serde_json::from_str(&payload)?;
        tracing::debug!(user_id = %user_id, stage = session.stage_name(), "Loaded session");
        Ok(Some(session))
    }

    async fn set(&self, session: &Session, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(session.user_id);
        let payload = serde_json::to_string(session)?;
        let ttl_seconds = ttl_seconds(ttl);

        let _: () = conn.set_ex(&key, payload, ttl_seconds).await?;

        tracing::debug!(
            user_id = %session.user_id,
            stage = session.stage_name(),
            ttl_seconds,
            "Saved session"
        );
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.del(Self::session_key(user_id)).await?;

        tracing::debug!(user_id = %user_id, "Cleared session");
        Ok(())
    }
}
