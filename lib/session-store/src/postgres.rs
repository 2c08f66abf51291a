//! PostgreSQL session store.
//!
//! Sessions live in a single `sessions` table with the principal serialized
//! as JSONB. Expiry is an indexed timestamp column: reads filter on it, and
//! a periodic [`SessionStore::delete_expired`] sweep removes lapsed rows.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pathfinder_gate_access::{Principal, Session, SessionId};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::store::{SessionStore, StoreError, StoreResult};

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    principal: Option<serde_json::Value>,
    flash: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, StoreError> {
        let principal: Option<Principal> = match self.principal {
            Some(value) => {
                Some(
                    serde_json::from_value(value).map_err(|e| StoreError::Serialization {
                        details: format!("invalid principal for session '{}': {}", self.id, e),
                    })?,
                )
            }
            None => None,
        };

        Ok(Session::from_parts(
            SessionId::new(self.id),
            principal,
            self.flash,
            self.created_at,
            self.expires_at,
        ))
    }
}

/// PostgreSQL-backed session store.
#[derive(Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and runs pending migrations.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StoreError::Backend {
                details: format!("failed to connect: {e}"),
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend {
                details: format!("failed to run migrations: {e}"),
            })?;

        Ok(Self::new(pool))
    }
}

fn backend_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend {
        details: e.to_string(),
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn get(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, principal, flash, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_session()?)),
            None => Ok(None),
        }
    }

    async fn put(&self, session: &Session, ttl: Duration) -> StoreResult<()> {
        let mut record = session.clone();
        record.touch(ttl);

        let principal_json = match record.principal() {
            Some(principal) => {
                Some(
                    serde_json::to_value(principal).map_err(|e| StoreError::Serialization {
                        details: e.to_string(),
                    })?,
                )
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, principal, flash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET principal = EXCLUDED.principal,
                flash = EXCLUDED.flash,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(record.id().as_str())
        .bind(principal_json)
        .bind(record.flash())
        .bind(record.created_at())
        .bind(record.expires_at())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(result.rows_affected())
    }
}
