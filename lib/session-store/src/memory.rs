//! In-process memory session store.
//!
//! Suitable for development and tests only: sessions are lost on restart and
//! the store cannot be shared across processes. Selecting it is logged with
//! a warning at startup (see [`crate::backend::connect`]).

use async_trait::async_trait;
use chrono::Duration;
use pathfinder_gate_access::{Session, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{SessionStore, StoreResult};

/// Memory-backed session store.
///
/// Expired rows are filtered on read and dropped lazily; `delete_expired`
/// sweeps the whole map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemoryStore {
    /// Creates an empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(id.as_str()) {
                Some(session) if !session.is_expired() => return Ok(Some(session.clone())),
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.sessions.write().await.remove(id.as_str());
        }
        Ok(None)
    }

    async fn put(&self, session: &Session, ttl: Duration) -> StoreResult<()> {
        let mut record = session.clone();
        record.touch(ttl);

        self.sessions
            .write()
            .await
            .insert(record.id().as_str().to_string(), record);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        self.sessions.write().await.remove(id.as_str());
        Ok(())
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
