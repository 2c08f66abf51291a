//! Backend selection, resolved once at startup.
//!
//! The configured backend is turned into a constructed `Arc<dyn
//! SessionStore>` before the router is built; request logic only ever sees
//! the trait object.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::memory::MemoryStore;
use crate::postgres::PostgresStore;
use crate::redis::RedisStore;
use crate::store::{SessionStore, StoreError, StoreResult};

/// Which persistence backend holds session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local memory. Dev/test only: lost on restart, single process.
    Memory,
    /// PostgreSQL `sessions` table.
    Postgres,
    /// Redis keys with native expiry.
    Redis,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Selected backend.
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Connection URL; required for the postgres and redis backends.
    #[serde(default)]
    pub url: Option<String>,

    /// Key prefix for the redis backend.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_key_prefix() -> String {
    "gate".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

/// Builds the configured session store.
///
/// The memory backend is flagged loudly: it loses every session on restart
/// and cannot back more than one process, so it must never be the quiet
/// default in production.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn SessionStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!(
                "memory session store selected: sessions are lost on restart \
                 and cannot be shared across processes (dev/test only)"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| StoreError::Configuration {
                details: "postgres backend requires a connection url".to_string(),
            })?;
            Ok(Arc::new(PostgresStore::connect(url).await?))
        }
        StoreBackend::Redis => {
            let url = config.url.as_deref().ok_or_else(|| StoreError::Configuration {
                details: "redis backend requires a connection url".to_string(),
            })?;
            Ok(Arc::new(RedisStore::connect(url, config.key_prefix.clone())?))
        }
    }
}
