//! Pluggable session persistence for the Pathfinder gate.
//!
//! This crate provides:
//! - The [`SessionStore`] contract: `get`/`put`/`delete` keyed by session ID,
//!   with a sliding TTL measured from the last write
//! - Three adapters: in-process memory (dev/test), PostgreSQL, and Redis
//! - [`StoreBackend`]/[`StoreConfig`]: the backend is picked once at startup
//!   and injected as a constructed `Arc<dyn SessionStore>`; request logic
//!   never branches on it
//!
//! Sessions are independently keyed; two requests for the same session are
//! resolved last-write-wins, with no cross-session coordination.

pub mod backend;
pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

// Re-export main types at crate root
pub use backend::{StoreBackend, StoreConfig, connect};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use redis::RedisStore;
pub use store::{SessionStore, StoreError, StoreResult};
