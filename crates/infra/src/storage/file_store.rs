//! JSON-file implementation of the mutation store port.
//!
//! The whole queue is a single JSON array on disk. Every mutation rewrites the
//! file through a temporary sibling that is synced and then renamed over the
//! original, so a crash leaves either the old or the new queue, never a torn
//! one. Malformed entries are dropped on read.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fieldsync_core::{MutationStore, QueueChanged, QueueNotifier};
use fieldsync_domain::{FieldSyncError, MutationId, QueuedMutation, Result as DomainResult};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

pub struct JsonFileMutationStore {
    path: PathBuf,
    lock: Mutex<()>,
    notifier: QueueNotifier,
}

impl JsonFileMutationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()), notifier: QueueNotifier::default() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Vec<QueuedMutation> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "queue file does not exist yet");
                return Vec::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read queue file; treating as empty");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(path = %self.path.display(), "queue file is not a JSON array; treating as empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "queue file is not valid JSON; treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<QueuedMutation>(entry) {
                Ok(mutation) => Some(mutation),
                Err(err) => {
                    warn!(error = %err, "skipping malformed queue entry");
                    None
                }
            })
            .collect()
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    async fn save(&self, items: &[QueuedMutation]) -> DomainResult<()> {
        let data = serde_json::to_vec(items)?;
        let temp_path = self.path.with_extension("tmp");

        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(io_error)?;
        file.write_all(&data).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(io_error)?;
        debug!(bytes = data.len(), "queue file persisted");
        Ok(())
    }

    /// Load, apply `change`, persist and notify, all under the store lock.
    async fn modify<F>(&self, change: F) -> DomainResult<usize>
    where
        F: FnOnce(&mut Vec<QueuedMutation>) -> DomainResult<()> + Send,
    {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await;
        change(&mut items)?;
        self.save(&items).await?;

        let count = items.len();
        self.notifier.notify(count);
        Ok(count)
    }
}

#[async_trait]
impl MutationStore for JsonFileMutationStore {
    async fn read_all(&self) -> Vec<QueuedMutation> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn append(&self, mutation: &QueuedMutation) -> DomainResult<usize> {
        self.modify(|items| {
            if items.iter().any(|item| item.id == mutation.id) {
                return Err(FieldSyncError::InvalidInput(format!(
                    "mutation {} is already queued",
                    mutation.id
                )));
            }
            items.push(mutation.clone());
            Ok(())
        })
        .await
    }

    async fn update(&self, mutation: &QueuedMutation) -> DomainResult<usize> {
        self.modify(|items| {
            let slot = items
                .iter_mut()
                .find(|item| item.id == mutation.id)
                .ok_or_else(|| FieldSyncError::NotFound(format!("mutation {}", mutation.id)))?;
            slot.attempts = slot.attempts.max(mutation.attempts);
            slot.last_error.clone_from(&mutation.last_error);
            Ok(())
        })
        .await
    }

    async fn remove(&self, id: &MutationId) -> DomainResult<usize> {
        self.modify(|items| {
            let position = items
                .iter()
                .position(|item| &item.id == id)
                .ok_or_else(|| FieldSyncError::NotFound(format!("mutation {id}")))?;
            items.remove(position);
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> DomainResult<usize> {
        self.modify(|items| {
            items.clear();
            Ok(())
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged> {
        self.notifier.subscribe()
    }
}

fn io_error(err: std::io::Error) -> FieldSyncError {
    FieldSyncError::from(InfraError::from(err))
}
