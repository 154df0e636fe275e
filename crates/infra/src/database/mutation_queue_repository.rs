//! SQLite-backed implementation of the mutation store port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldsync_core::{MutationStore, QueueChanged, QueueNotifier};
use fieldsync_domain::{
    FieldSyncError, HttpMethod, MutationId, QueuedMutation, Result as DomainResult,
};
use rusqlite::{params, Connection, Row};
use tokio::sync::{broadcast, Mutex};
use tokio::task;
use tracing::{debug, warn};

use super::manager::{map_sql_error, DbManager};

/// SQLite-backed durable queue.
///
/// Writes are serialized through an async mutex so read-modify-write cycles
/// from concurrent tasks never interleave.
pub struct SqliteMutationStore {
    db: Arc<DbManager>,
    write_lock: Mutex<()>,
    notifier: QueueNotifier,
}

impl SqliteMutationStore {
    /// Construct a store backed by the shared manager. Migrations must have
    /// been applied.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, write_lock: Mutex::new(()), notifier: QueueNotifier::default() }
    }

    async fn run_blocking<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<T> {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }

    fn fetch_all(conn: &Connection) -> DomainResult<Vec<QueuedMutation>> {
        let mut stmt = conn.prepare(QUEUE_SELECT_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map([], map_queue_row).map_err(map_sql_error)?;

        let mut items = Vec::new();
        for row in rows {
            match row {
                Ok(raw) => {
                    if let Some(mutation) = raw.into_mutation() {
                        items.push(mutation);
                    }
                }
                Err(err) => warn!(error = %err, "skipping unreadable queue row"),
            }
        }
        Ok(items)
    }

    fn count(conn: &Connection) -> DomainResult<usize> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM mutation_queue", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn insert_entry(conn: &Connection, mutation: &QueuedMutation) -> DomainResult<()> {
        let body_json = mutation.body.as_ref().map(serde_json::to_string).transpose()?;
        conn.execute(
            QUEUE_INSERT_SQL,
            params![
                mutation.id.as_str(),
                mutation.target,
                mutation.method.as_str(),
                body_json,
                mutation.created_at.to_rfc3339(),
                mutation.attempts,
                mutation.last_error,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn require_changed(changed: usize, id: &MutationId) -> DomainResult<()> {
        if changed == 0 {
            return Err(FieldSyncError::NotFound(format!("mutation {id}")));
        }
        Ok(())
    }

    fn publish(&self, count: usize) -> usize {
        self.notifier.notify(count);
        count
    }
}

#[async_trait]
impl MutationStore for SqliteMutationStore {
    async fn read_all(&self) -> Vec<QueuedMutation> {
        match self.run_blocking(Self::fetch_all).await {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "failed to read mutation queue; treating as empty");
                Vec::new()
            }
        }
    }

    async fn append(&self, mutation: &QueuedMutation) -> DomainResult<usize> {
        let _guard = self.write_lock.lock().await;
        let entry = mutation.clone();

        let count = self
            .run_blocking(move |conn| {
                Self::insert_entry(conn, &entry)?;
                Self::count(conn)
            })
            .await?;

        debug!(mutation_id = %mutation.id, count, "mutation appended");
        Ok(self.publish(count))
    }

    async fn update(&self, mutation: &QueuedMutation) -> DomainResult<usize> {
        let _guard = self.write_lock.lock().await;
        let entry = mutation.clone();

        let count = self
            .run_blocking(move |conn| {
                let changed = conn
                    .execute(
                        QUEUE_UPDATE_SQL,
                        params![entry.id.as_str(), entry.attempts, entry.last_error],
                    )
                    .map_err(map_sql_error)?;
                Self::require_changed(changed, &entry.id)?;
                Self::count(conn)
            })
            .await?;

        Ok(self.publish(count))
    }

    async fn remove(&self, id: &MutationId) -> DomainResult<usize> {
        let _guard = self.write_lock.lock().await;
        let id = id.clone();

        let count = self
            .run_blocking(move |conn| {
                let changed = conn
                    .execute("DELETE FROM mutation_queue WHERE id = ?1", params![id.as_str()])
                    .map_err(map_sql_error)?;
                Self::require_changed(changed, &id)?;
                Self::count(conn)
            })
            .await?;

        Ok(self.publish(count))
    }

    async fn clear(&self) -> DomainResult<usize> {
        let _guard = self.write_lock.lock().await;

        let removed = self
            .run_blocking(|conn| {
                conn.execute("DELETE FROM mutation_queue", []).map_err(map_sql_error)
            })
            .await?;

        debug!(removed, "mutation queue cleared");
        Ok(self.publish(0))
    }

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged> {
        self.notifier.subscribe()
    }

    async fn len(&self) -> usize {
        match self.run_blocking(Self::count).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "failed to count mutation queue");
                0
            }
        }
    }
}

const QUEUE_INSERT_SQL: &str = "INSERT INTO mutation_queue (
        id, target, method, body_json, created_at, attempts, last_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const QUEUE_SELECT_SQL: &str = "SELECT
        id, target, method, body_json, created_at, attempts, last_error
    FROM mutation_queue
    ORDER BY seq ASC";

// Attempts only ever grow.
const QUEUE_UPDATE_SQL: &str = "UPDATE mutation_queue
    SET attempts = MAX(attempts, ?2), last_error = ?3
    WHERE id = ?1";

/// Column values as stored, before domain validation.
struct RawQueueRow {
    id: String,
    target: String,
    method: String,
    body_json: Option<String>,
    created_at: String,
    attempts: i64,
    last_error: Option<String>,
}

impl RawQueueRow {
    fn into_mutation(self) -> Option<QueuedMutation> {
        let method = match self.method.parse::<HttpMethod>() {
            Ok(method) => method,
            Err(err) => {
                warn!(mutation_id = %self.id, error = %err, "skipping queue row with invalid method");
                return None;
            }
        };

        let created_at = match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                warn!(mutation_id = %self.id, error = %err, "skipping queue row with invalid timestamp");
                return None;
            }
        };

        let body = match self.body_json.as_deref().map(serde_json::from_str).transpose() {
            Ok(body) => body,
            Err(err) => {
                warn!(mutation_id = %self.id, error = %err, "skipping queue row with invalid body");
                return None;
            }
        };

        Some(QueuedMutation {
            id: MutationId::from(self.id),
            target: self.target,
            method,
            body,
            created_at,
            attempts: u32::try_from(self.attempts).unwrap_or_default(),
            last_error: self.last_error,
        })
    }
}

fn map_queue_row(row: &Row<'_>) -> rusqlite::Result<RawQueueRow> {
    Ok(RawQueueRow {
        id: row.get(0)?,
        target: row.get(1)?,
        method: row.get(2)?,
        body_json: row.get(3)?,
        created_at: row.get(4)?,
        attempts: row.get(5)?,
        last_error: row.get(6)?,
    })
}

fn map_join_error(err: task::JoinError) -> FieldSyncError {
    if err.is_cancelled() {
        FieldSyncError::Internal("queue task cancelled".into())
    } else {
        FieldSyncError::Internal(format!("queue task panic: {err}"))
    }
}
