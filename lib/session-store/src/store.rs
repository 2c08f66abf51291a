//! The session store contract.

use async_trait::async_trait;
use chrono::Duration;
use pathfinder_gate_access::{Session, SessionId};
use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    Backend { details: String },
    /// A stored record could not be encoded or decoded.
    Serialization { details: String },
    /// The store configuration is incomplete or invalid.
    Configuration { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => write!(f, "session store backend error: {details}"),
            Self::Serialization { details } => {
                write!(f, "session record serialization error: {details}")
            }
            Self::Configuration { details } => {
                write!(f, "session store configuration error: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Result type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Session persistence, keyed by session ID.
///
/// Contract:
/// - `put` persists the record with a TTL measured from now (the last
///   write); sliding renewal is a `Session::touch` followed by a `put`
/// - `get` returns `None` for absent *and* expired records
/// - `delete` is idempotent: deleting an absent ID is `Ok`
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Fetches a live session by ID.
    async fn get(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Writes the session, restarting its TTL from now.
    async fn put(&self, session: &Session, ttl: Duration) -> StoreResult<()>;

    /// Removes the session. Removing an absent ID is a no-op.
    async fn delete(&self, id: &SessionId) -> StoreResult<()>;

    /// Sweeps expired rows, returning how many were removed.
    ///
    /// Backends with native expiry (Redis) keep the default no-op.
    async fn delete_expired(&self) -> StoreResult<u64> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Backend {
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("backend error"));
        assert!(err.to_string().contains("connection refused"));

        let err = StoreError::Configuration {
            details: "missing url".to_string(),
        };
        assert!(err.to_string().contains("configuration error"));
    }
}
