//! SQLite Document Store with Connection Pooling
//!
//! Every collection lives in one `documents` table keyed by
//! `(collection, id)`, with the entity serialized as JSON text:
//! - Connection pooling via r2d2 for concurrent access
//! - Version-tracked migrations
//! - WAL mode for concurrent readers

use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::DocumentStore;
use crate::constants::storage as storage_constants;
use crate::types::{HubError, Result, ResultExt, log_filter_warn, now_rfc3339};

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 2;

struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create documents table",
        up: "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (collection, id)
            )",
    },
    Migration {
        version: 2,
        description: "Add collection listing index",
        up: "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq)",
    },
];

/// Thread-safe document database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (creating parent directories) and initialize the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(Self::configure_connection);
        let pool = Pool::builder()
            .max_size(storage_constants::POOL_SIZE)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)
            .map_err(|e| HubError::Storage(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.initialize()?;
        tracing::debug!("Opened document database at {}", path.display());
        Ok(db)
    }

    /// In-memory database for tests. One connection, since each in-memory
    /// connection is its own database.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| HubError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        let db = Self { pool };
        db.initialize()?;
        Ok(db)
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = {};
            "#,
            storage_constants::BUSY_TIMEOUT_MS
        ))?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            HubError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let current_version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(SCHEMA)
                .with_context("Failed to initialize database schema")?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
            return Ok(());
        }

        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;
                tracing::info!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to update schema version")?;
        }
        Ok(())
    }

    fn decode(collection: &str, id: &str, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| {
            HubError::Storage(format!("Corrupt document {}/{}: {}", collection, id, e))
        })
    }
}

impl DocumentStore for Database {
    fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq")
            .with_context("Failed to prepare listing")?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .with_context_fn(|| format!("Failed to list {}", collection))?;

        let mut docs = Vec::new();
        for row in rows {
            let Some((id, body)) = log_filter_warn(row, "Skipping unreadable row") else {
                continue;
            };
            if let Some(doc) = log_filter_warn(
                Self::decode(collection, &id, &body),
                "Skipping corrupt document",
            ) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn()?
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| Self::decode(collection, id, &b)).transpose()
    }

    fn insert(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        let inserted = self
            .conn()?
            .execute(
                "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(collection, id) DO NOTHING",
                params![collection, id, body, now_rfc3339()],
            )
            .with_context_fn(|| format!("Failed to insert {}/{}", collection, id))?;

        if inserted == 0 {
            return Err(HubError::Storage(format!(
                "Document {}/{} already exists",
                collection, id
            )));
        }
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, doc: &Value) -> Result<bool> {
        let body = serde_json::to_string(doc)?;
        let updated = self
            .conn()?
            .execute(
                "UPDATE documents SET body = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
                params![collection, id, body, now_rfc3339()],
            )
            .with_context_fn(|| format!("Failed to update {}/{}", collection, id))?;
        Ok(updated > 0)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let deleted = self
            .conn()?
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .with_context_fn(|| format!("Failed to delete {}/{}", collection, id))?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");

        let conn = db.conn().expect("Failed to get connection");
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert!(tables.contains(&"documents".to_string()));

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_document_crud() {
        let db = Database::open_in_memory().unwrap();

        db.insert("tasks", "a", &json!({"id": "a", "title": "first"})).unwrap();
        db.insert("tasks", "b", &json!({"id": "b", "title": "second"})).unwrap();
        db.insert("knowledge", "a", &json!({"id": "a"})).unwrap();
        assert!(db.insert("tasks", "a", &json!({})).is_err());

        let listed = db.list("tasks").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["title"], "first");

        assert!(db.update("tasks", "a", &json!({"id": "a", "title": "edited"})).unwrap());
        assert!(!db.update("tasks", "zzz", &json!({})).unwrap());
        assert_eq!(db.get("tasks", "a").unwrap().unwrap()["title"], "edited");
        // Update keeps listing position
        assert_eq!(db.list("tasks").unwrap()[0]["id"], "a");

        assert!(db.delete("tasks", "a").unwrap());
        assert!(!db.delete("tasks", "a").unwrap());
        assert_eq!(db.get("tasks", "a").unwrap(), None);
        assert_eq!(db.list("knowledge").unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hub.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert("analysis_history", "h1", &json!({"id": "h1"})).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.list("analysis_history").unwrap().len(), 1);
    }
}
