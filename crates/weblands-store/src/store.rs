//! Store handle: connection lifecycle, pragmas, setup and migrations.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;
use crate::schema::{MIGRATIONS, SCHEMA, TABLES};

/// Shared persistence handle.
///
/// Cheap to share behind an `Arc`; all access serializes on the inner
/// mutex, which matches the engine's "writes are synchronous and atomic
/// per entity" contract.
pub struct Store {
    pub(crate) conn: Mutex<Connection>,
}

impl Store {
    /// Opens (or creates) the database file and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| StoreError::Open {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })?;
            }
        }
        let conn = Connection::open(path).map_err(|err| StoreError::Open {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::initialize(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|err| StoreError::Open {
            path: ":memory:".to_string(),
            reason: err.to_string(),
        })?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned mutex means a writer panicked mid-statement; the
        // connection itself is still usable for the remaining batches.
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Drops and recreates every table. Destructive; the CLI confirms
    /// before calling.
    pub fn setup(&self) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute_batch("PRAGMA foreign_keys=OFF;")?;
        for table in TABLES {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        info!("store schema created");
        Ok(())
    }

    /// Applies pending migrations, returning the versions executed.
    pub fn migrate(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.lock();
        let mut applied = Vec::new();
        for (version, sql) in MIGRATIONS {
            let done: bool = conn
                .prepare("SELECT 1 FROM schema_migrations WHERE version = ?1")?
                .exists([version])?;
            if done {
                continue;
            }
            let tx = conn.transaction()?;
            if !sql.is_empty() {
                tx.execute_batch(sql)?;
            }
            tx.execute(
                "INSERT INTO schema_migrations (version, executed_at) VALUES (?1, ?2)",
                rusqlite::params![version, to_column(Utc::now())],
            )?;
            tx.commit()?;
            info!(version, "migration applied");
            applied.push(version.to_string());
        }
        Ok(applied)
    }
}

/// Timestamps persist as RFC 3339 text.
pub(crate) fn to_column(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn from_column(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}
