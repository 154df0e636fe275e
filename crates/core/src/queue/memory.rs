//! Process-local queue store
//!
//! Keeps the queue in memory only. Useful for sessions that must not touch
//! disk and as the reference behaviour the durable stores are tested against.

use async_trait::async_trait;
use fieldsync_domain::{FieldSyncError, MutationId, QueuedMutation, Result};
use tokio::sync::{broadcast, Mutex};

use super::notifier::{QueueChanged, QueueNotifier};
use super::ports::MutationStore;

#[derive(Debug, Default)]
pub struct InMemoryMutationStore {
    items: Mutex<Vec<QueuedMutation>>,
    notifier: QueueNotifier,
}

impl InMemoryMutationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `items`, oldest first.
    pub fn with_items(items: Vec<QueuedMutation>) -> Self {
        Self { items: Mutex::new(items), notifier: QueueNotifier::default() }
    }
}

#[async_trait]
impl MutationStore for InMemoryMutationStore {
    async fn read_all(&self) -> Vec<QueuedMutation> {
        self.items.lock().await.clone()
    }

    async fn append(&self, mutation: &QueuedMutation) -> Result<usize> {
        let mut items = self.items.lock().await;
        if items.iter().any(|item| item.id == mutation.id) {
            return Err(FieldSyncError::InvalidInput(format!(
                "mutation {} is already queued",
                mutation.id
            )));
        }
        items.push(mutation.clone());
        let count = items.len();
        drop(items);

        self.notifier.notify(count);
        Ok(count)
    }

    async fn update(&self, mutation: &QueuedMutation) -> Result<usize> {
        let mut items = self.items.lock().await;
        let slot = items
            .iter_mut()
            .find(|item| item.id == mutation.id)
            .ok_or_else(|| FieldSyncError::NotFound(format!("mutation {}", mutation.id)))?;
        slot.attempts = slot.attempts.max(mutation.attempts);
        slot.last_error.clone_from(&mutation.last_error);
        let count = items.len();
        drop(items);

        self.notifier.notify(count);
        Ok(count)
    }

    async fn remove(&self, id: &MutationId) -> Result<usize> {
        let mut items = self.items.lock().await;
        let position = items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| FieldSyncError::NotFound(format!("mutation {id}")))?;
        items.remove(position);
        let count = items.len();
        drop(items);

        self.notifier.notify(count);
        Ok(count)
    }

    async fn clear(&self) -> Result<usize> {
        self.items.lock().await.clear();
        self.notifier.notify(0);
        Ok(0)
    }

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged> {
        self.notifier.subscribe()
    }

    async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}
