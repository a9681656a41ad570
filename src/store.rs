//! Per-user persisted recommendation lists.
//!
//! A list is replaced wholesale on every regeneration and read back in
//! offset/limit pages without recomputation.

use crate::errors::Result;
use crate::recommend::Window;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub trait RecommendationStore: Send + Sync {
    /// Replace any list stored for `user_id`.
    fn put(&self, user_id: &str, ids: &[u64]) -> Result<()>;

    /// `ids[offset..offset + limit]` of the stored list; empty for unknown
    /// users or an offset past the end.
    fn get(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<u64>>;
}

/// Process-local store. Readers hold an `Arc` to the list they saw, so a
/// concurrent `put` never exposes a half-written list.
#[derive(Debug, Default)]
pub struct MemoryRecommendationStore {
    lists: RwLock<HashMap<String, Arc<Vec<u64>>>>,
}

impl MemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.lists.read().len()
    }
}

impl RecommendationStore for MemoryRecommendationStore {
    fn put(&self, user_id: &str, ids: &[u64]) -> Result<()> {
        let list = Arc::new(ids.to_vec());
        self.lists.write().insert(user_id.to_string(), list);
        Ok(())
    }

    fn get(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<u64>> {
        let list = match self.lists.read().get(user_id) {
            Some(list) => Arc::clone(list),
            None => return Ok(Vec::new()),
        };
        Ok(Window::new(offset, limit).slice(list.as_slice()).to_vec())
    }
}

/// SQLite-backed store using the `user_recommendations` table. Each list is a
/// JSON array replaced with a single `INSERT OR REPLACE`.
pub struct SqliteRecommendationStore {
    conn: Mutex<Connection>,
}

impl SqliteRecommendationStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_recommendations (
                user_id TEXT PRIMARY KEY,
                recommendations TEXT
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecommendationStore for SqliteRecommendationStore {
    fn put(&self, user_id: &str, ids: &[u64]) -> Result<()> {
        let encoded = serde_json::to_string(ids)?;
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO user_recommendations (user_id, recommendations)
             VALUES (?1, ?2)",
            params![user_id, encoded],
        )?;
        debug!(user_id, len = ids.len(), "stored recommendation list");
        Ok(())
    }

    fn get(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<u64>> {
        let encoded: Option<Option<String>> = self
            .conn
            .lock()
            .query_row(
                "SELECT recommendations FROM user_recommendations WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(Some(encoded)) = encoded else {
            return Ok(Vec::new());
        };
        let list: Vec<u64> = serde_json::from_str(&encoded)?;
        Ok(Window::new(offset, limit).slice(list.as_slice()).to_vec())
    }
}
