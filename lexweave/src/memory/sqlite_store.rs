//! SQLite-backed StateStore. Persistent across process restarts.
//!
//! Snapshots are serialized to JSON text. Appends run inside an IMMEDIATE
//! transaction so sequence assignment is atomic and per-thread writes
//! serialize at the database level. Uses spawn_blocking for async.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Checkpoint, StateStore, StoreError};

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// SQLite checkpoint log. One row per checkpoint, keyed (thread_id, seq).
pub struct SqliteStore {
    db_path: std::path::PathBuf,
}

impl SqliteStore {
    /// Opens (or creates) the database and ensures the log table exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                step_name TEXT NOT NULL,
                state TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (thread_id, seq)
            )
            "#,
            [],
        )
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Self { db_path })
    }
}

#[async_trait]
impl<S> StateStore<S> for SqliteStore
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, StoreError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();

        let row = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT step_name, state, seq FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY seq DESC LIMIT 1",
                )
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let mut rows = stmt
                .query(params![thread_id])
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            match rows.next().map_err(|e| StoreError::Storage(e.to_string()))? {
                Some(row) => {
                    let step_name: String =
                        row.get(0).map_err(|e| StoreError::Storage(e.to_string()))?;
                    let state: String =
                        row.get(1).map_err(|e| StoreError::Storage(e.to_string()))?;
                    let seq: i64 = row.get(2).map_err(|e| StoreError::Storage(e.to_string()))?;
                    Ok::<_, StoreError>(Some((step_name, state, seq)))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))??;

        match row {
            Some((step_name, state_json, seq)) => {
                let state: S = serde_json::from_str(&state_json)?;
                Ok(Some(Checkpoint {
                    step_name,
                    state,
                    seq: seq as u64,
                }))
            }
            None => Ok(None),
        }
    }

    async fn append(
        &self,
        thread_id: &str,
        step_name: &str,
        state: &S,
    ) -> Result<u64, StoreError> {
        let thread_id = thread_id.to_string();
        let step_name = step_name.to_string();
        let state_json = serde_json::to_string(state)?;
        let db_path = self.db_path.clone();
        let created_at = now_millis();

        tokio::task::spawn_blocking(move || {
            let mut conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let seq: i64 = tx
                .query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM checkpoints WHERE thread_id = ?1",
                    params![thread_id],
                    |row| row.get(0),
                )
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            tx.execute(
                "INSERT INTO checkpoints (thread_id, seq, step_name, state, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![thread_id, seq, step_name, state_json, created_at],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
            Ok::<u64, StoreError>(seq as u64)
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint<S>>, StoreError> {
        let thread_id = thread_id.to_string();
        let db_path = self.db_path.clone();

        let rows = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT step_name, state, seq FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY seq ASC",
                )
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let mut out = Vec::new();
            let mut rows = stmt
                .query(params![thread_id])
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            while let Some(row) = rows.next().map_err(|e| StoreError::Storage(e.to_string()))? {
                let step_name: String =
                    row.get(0).map_err(|e| StoreError::Storage(e.to_string()))?;
                let state: String = row.get(1).map_err(|e| StoreError::Storage(e.to_string()))?;
                let seq: i64 = row.get(2).map_err(|e| StoreError::Storage(e.to_string()))?;
                out.push((step_name, state, seq));
            }
            Ok::<_, StoreError>(out)
        })
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))??;

        rows.into_iter()
            .map(|(step_name, state_json, seq)| {
                let state: S = serde_json::from_str(&state_json)?;
                Ok(Checkpoint {
                    step_name,
                    state,
                    seq: seq as u64,
                })
            })
            .collect()
    }
}
