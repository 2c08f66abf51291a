//! Redis session store.
//!
//! Each session is one JSON value under a prefixed key, written with `SET EX`
//! so the TTL restarts on every write. Expiry is native: lapsed keys simply
//! disappear, so the default no-op `delete_expired` applies.

use async_trait::async_trait;
use chrono::Duration;
use pathfinder_gate_access::{Session, SessionId};
use redis::{AsyncCommands, Client};

use crate::store::{SessionStore, StoreError, StoreResult};

/// Redis-backed session store.
#[derive(Debug)]
pub struct RedisStore {
    client: Client,
    /// Key prefix for all session keys (e.g. `gate`).
    prefix: String,
}

impl RedisStore {
    /// Creates a store for the given Redis URL and key prefix.
    ///
    /// The connection itself is established lazily per operation via a
    /// multiplexed connection.
    pub fn connect(url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        let client = Client::open(url).map_err(|e| StoreError::Configuration {
            details: format!("invalid redis url: {e}"),
        })?;

        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn key(&self, id: &SessionId) -> String {
        format!("{}:session:{}", self.prefix, id)
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Backend {
                details: e.to_string(),
            })
    }
}

fn backend_error(e: redis::RedisError) -> StoreError {
    StoreError::Backend {
        details: e.to_string(),
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let mut con = self.connection().await?;
        let value: Option<String> = con.get(self.key(id)).await.map_err(backend_error)?;

        match value {
            Some(json) => {
                let session =
                    serde_json::from_str(&json).map_err(|e| StoreError::Serialization {
                        details: format!("invalid session record for '{id}': {e}"),
                    })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, session: &Session, ttl: Duration) -> StoreResult<()> {
        let mut record = session.clone();
        record.touch(ttl);

        let json = serde_json::to_string(&record).map_err(|e| StoreError::Serialization {
            details: e.to_string(),
        })?;

        // SET EX restarts the TTL from this write.
        let seconds = ttl.num_seconds().max(1) as u64;
        let mut con = self.connection().await?;
        let _: () = con
            .set_ex(self.key(record.id()), json, seconds)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        // DEL of an absent key is already a no-op, which gives idempotence.
        let mut con = self.connection().await?;
        let _: () = con.del(self.key(id)).await.map_err(backend_error)?;
        Ok(())
    }
}
