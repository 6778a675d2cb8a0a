//! Error types for the ordering workflow.
//!
//! User-input failures live in [`crate::validation::ValidationError`] and never
//! travel through these types: they become `ShowError` effects inside the
//! reducer. Everything here is infrastructure.

use thiserror::Error;

/// Result type alias for session store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Failures of the volatile session store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Cache unreachable or command rejected.
    #[error("Session store error: {0}")]
    Connection(String),

    /// Stored record could not be encoded or decoded.
    #[error("Session serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failures of the durable order/product store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Connection, pool or query failure. Retried by the gateway.
    #[error("Database error: {0}")]
    Database(String),

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record ("product", "order")
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Stored row could not be mapped into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The database refused the values themselves (a data exception or a
    /// constraint violation). Resending the same row fails the same way.
    #[error("Rejected by the database: {0}")]
    Rejected(String),
}

impl RepositoryError {
    /// Shorthand for a missing product.
    #[must_use]
    pub fn product_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing order.
    #[must_use]
    pub fn order_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "order",
            id: id.to_string(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Only infrastructure failures are transient. A missing record, a rejected
    /// row or a row that cannot be decoded will fail the same way every time.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
                Self::Corrupt(err.to_string())
            },
            sqlx::Error::Database(db) if db.code().is_some_and(|code| rejects_data(&code)) => {
                Self::Rejected(db.to_string())
            },
            other => Self::Database(other.to_string()),
        }
    }
}

/// SQLSTATE classes 22 (data exception) and 23 (integrity constraint violation).
fn rejects_data(sqlstate: &str) -> bool {
    sqlstate.starts_with("22") || sqlstate.starts_with("23")
}

/// Terminal failures surfaced by the persistence gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Every attempt failed, or the first failure was not worth retrying.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Persistence {
        /// Repository operation that was attempted
        operation: &'static str,
        /// Attempts made before giving up
        attempts: usize,
        /// Error of the last attempt
        #[source]
        source: RepositoryError,
    },

    /// The referenced record does not exist. Never retried.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },
}

impl GatewayError {
    /// Wraps the last error of a failed retry loop.
    #[must_use]
    pub fn from_failure(operation: &'static str, attempts: usize, error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            source => Self::Persistence {
                operation,
                attempts,
                source,
            },
        }
    }

    /// Whether the failure means the record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Anything that can go wrong while handling one inbound input.
///
/// Caught at the orchestrator boundary and turned into an apology.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Session could not be loaded or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Durable store gave up.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid value '{value}' for {name}: {reason}")]
pub struct ConfigError {
    /// Environment variable name
    pub name: &'static str,
    /// Raw value that was rejected
    pub value: String,
    /// What was expected
    pub reason: String,
}
