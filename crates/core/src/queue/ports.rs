//! Port interfaces for queue operations

use async_trait::async_trait;
use fieldsync_domain::{HttpResponse, MutationId, OutboundRequest, QueuedMutation, Result};
use tokio::sync::broadcast;

use super::notifier::QueueChanged;

/// Durable, ordered store of deferred mutations.
///
/// Implementations serialize their own read-modify-write cycles and publish a
/// [`QueueChanged`] event after every successful mutation.
#[async_trait]
pub trait MutationStore: Send + Sync {
    /// Full snapshot in insertion order, oldest first.
    ///
    /// Unreadable or malformed storage reads as an empty queue; individual
    /// malformed records are skipped.
    async fn read_all(&self) -> Vec<QueuedMutation>;

    /// Append at the tail. Returns the new queue length.
    async fn append(&self, mutation: &QueuedMutation) -> Result<usize>;

    /// Persist `attempts` and `last_error` for an existing item. Returns the
    /// queue length, or `NotFound` if the id is no longer queued.
    async fn update(&self, mutation: &QueuedMutation) -> Result<usize>;

    /// Remove an item. Returns the new queue length, or `NotFound` if the id is
    /// no longer queued.
    async fn remove(&self, id: &MutationId) -> Result<usize>;

    /// Drop every queued item.
    async fn clear(&self) -> Result<usize>;

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged>;

    async fn len(&self) -> usize {
        self.read_all().await.len()
    }

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn get(&self, id: &MutationId) -> Option<QueuedMutation> {
        self.read_all().await.into_iter().find(|mutation| &mutation.id == id)
    }
}

/// Performs one HTTP call.
///
/// Any status code is an `Ok` response; `Err` means the call itself failed
/// (network unreachable, timeout, invalid target). Implementations must not
/// retry on their own.
#[async_trait]
pub trait MutationTransport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<HttpResponse>;
}

/// Supplies the current bearer token, if the user is signed in.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Token provider returning a fixed value.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    /// Provider for signed-out sessions.
    pub const fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
