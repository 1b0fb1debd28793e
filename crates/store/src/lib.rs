//! Tollgate Store
//!
//! Persistent session records, SQLite-backed. One table, per-statement
//! atomicity; no cross-statement transactions. The reconciliation jobs
//! scan the full table each tick and write single-row statements, so
//! concurrent mutation between a read and a write is tolerated by design
//! (see the node crate).

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

use tollgate_core::Session;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS sessions (
    id         INTEGER PRIMARY KEY,
    key        TEXT    NOT NULL,
    address    TEXT    NOT NULL,
    upload     INTEGER NOT NULL DEFAULT 0,
    download   INTEGER NOT NULL DEFAULT 0,
    available  INTEGER NOT NULL DEFAULT 0,
    created_at TEXT    NOT NULL
)";

const CREATE_KEY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_key ON sessions (key)";

/// Handle to the local session table.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Connect to the given SQLite URL and create the schema if absent.
    ///
    /// Accepts `sqlite::memory:` for an in-memory store.
    pub async fn open(url: &str) -> Result<Self> {
        // A single connection keeps `sqlite::memory:` databases coherent
        // across calls; the jobs are low-traffic either way.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_KEY_INDEX).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Record a newly established session.
    pub async fn insert(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, key, address, upload, download, available, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(session.id)
        .bind(&session.key)
        .bind(&session.address)
        .bind(session.upload)
        .bind(session.download)
        .bind(session.available)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up the session correlated with a tunnel peer key.
    pub async fn find_by_key(&self, key: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE key = ?1 ORDER BY id LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    /// All session rows, including retired ones awaiting purge.
    pub async fn all(&self) -> Result<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>("SELECT * FROM sessions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    /// Overwrite a session's traffic counters with the latest observation.
    pub async fn update_counters(&self, id: i64, upload: i64, download: i64) -> Result<()> {
        sqlx::query("UPDATE sessions SET upload = ?2, download = ?3 WHERE id = ?1")
            .bind(id)
            .bind(upload)
            .bind(download)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Soft-delete: clear the session's address, marking it for purge.
    pub async fn clear_address(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE sessions SET address = '' WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Hard-delete every retired row; returns the number removed.
    pub async fn purge_deleted(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE address = ''")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
