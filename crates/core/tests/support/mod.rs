//! Shared test helpers for `fieldsync-core` integration tests.
//!
//! Provides a scripted transport so gate and replay tests can focus on queue
//! behaviour instead of HTTP plumbing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use fieldsync_core::{ConnectivityFlag, MutationStore, MutationTransport};
use fieldsync_domain::{
    FieldSyncError, HttpResponse, OutboundRequest, QueuedMutation, Result as DomainResult,
};
use tokio::sync::Mutex;

/// Transport that replays a scripted list of outcomes and records every call.
///
/// When the script runs dry the fallback status is returned.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<DomainResult<HttpResponse>>>,
    sent: Mutex<Vec<OutboundRequest>>,
    fallback: u16,
    offline_after: Option<(usize, Arc<ConnectivityFlag>)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self { script: Mutex::new(VecDeque::new()), sent: Mutex::new(Vec::new()), fallback: 200, offline_after: None }
    }

    /// Transport whose every call answers `status`.
    pub fn always(status: u16) -> Self {
        Self { fallback: status, ..Self::new() }
    }

    pub fn respond(self, status: u16) -> Self {
        self.push(Ok(HttpResponse::new(status)))
    }

    pub fn respond_with_body(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(HttpResponse::new(status).with_body(body.into())))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(FieldSyncError::Network(message.to_string())))
    }

    /// Flip `flag` offline once `calls` sends have completed.
    pub fn go_offline_after(mut self, calls: usize, flag: Arc<ConnectivityFlag>) -> Self {
        self.offline_after = Some((calls, flag));
        self
    }

    fn push(self, outcome: DomainResult<HttpResponse>) -> Self {
        self.script.try_lock().expect("script lock").push_back(outcome);
        self
    }

    pub async fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl MutationTransport for ScriptedTransport {
    async fn send(&self, request: &OutboundRequest) -> DomainResult<HttpResponse> {
        let calls = {
            let mut sent = self.sent.lock().await;
            sent.push(request.clone());
            sent.len()
        };

        let outcome =
            self.script.lock().await.pop_front().unwrap_or_else(|| Ok(HttpResponse::new(self.fallback)));

        if let Some((after, flag)) = &self.offline_after {
            if calls >= *after {
                flag.set_online(false);
            }
        }

        outcome
    }
}

/// Transport whose sends never complete.
pub struct HangingTransport {
    calls: Mutex<usize>,
}

impl HangingTransport {
    pub fn new() -> Self {
        Self { calls: Mutex::new(0) }
    }

    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl MutationTransport for HangingTransport {
    async fn send(&self, _request: &OutboundRequest) -> DomainResult<HttpResponse> {
        *self.calls.lock().await += 1;
        std::future::pending().await
    }
}

/// Transport that appends `late` to the store during its first send, then
/// answers 200 to everything.
pub struct EnqueuingTransport {
    store: Arc<dyn MutationStore>,
    late: Mutex<Option<QueuedMutation>>,
}

impl EnqueuingTransport {
    pub fn new(store: Arc<dyn MutationStore>, late: QueuedMutation) -> Self {
        Self { store, late: Mutex::new(Some(late)) }
    }
}

#[async_trait]
impl MutationTransport for EnqueuingTransport {
    async fn send(&self, _request: &OutboundRequest) -> DomainResult<HttpResponse> {
        let late = self.late.lock().await.take();
        if let Some(item) = late {
            self.store.append(&item).await?;
        }
        Ok(HttpResponse::new(200))
    }
}
