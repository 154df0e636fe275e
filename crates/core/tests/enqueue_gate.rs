//! Integration tests for the enqueue gate.

mod support;

use std::sync::Arc;

use fieldsync_core::{
    ConnectivityFlag, EnqueueGate, InMemoryMutationStore, MutationStore, ReplayEngine,
    StaticTokenProvider,
};
use fieldsync_domain::{HttpMethod, MutationRequest};
use serde_json::json;
use support::ScriptedTransport;

struct Harness {
    store: Arc<InMemoryMutationStore>,
    transport: Arc<ScriptedTransport>,
    connectivity: Arc<ConnectivityFlag>,
    gate: EnqueueGate,
}

fn harness(transport: ScriptedTransport, online: bool) -> Harness {
    let store = Arc::new(InMemoryMutationStore::new());
    let transport = Arc::new(transport);
    let connectivity = Arc::new(ConnectivityFlag::new(online));
    let gate = EnqueueGate::new(store.clone(), transport.clone(), connectivity.clone());
    Harness { store, transport, connectivity, gate }
}

fn complete_ticket() -> MutationRequest {
    MutationRequest::new("/api/tickets/42/complete")
        .with_body(json!({"notes": "replaced filter"}))
        .with_header("x-request-id", "req-1")
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_write_is_queued_without_network_call() {
    let h = harness(ScriptedTransport::new(), false);

    let outcome = h.gate.execute(complete_ticket()).await.unwrap();

    assert!(outcome.queued);
    assert!(outcome.response.is_none());
    assert_eq!(h.transport.call_count().await, 0);

    let queued = h.store.read_all().await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].target, "/api/tickets/42/complete");
    assert_eq!(queued[0].method, HttpMethod::Post);
    assert_eq!(queued[0].attempts, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_write_is_not_queued() {
    let h = harness(ScriptedTransport::new().respond(201), true);

    let outcome = h.gate.execute(complete_ticket()).await.unwrap();

    assert!(!outcome.queued);
    assert_eq!(outcome.response.map(|r| r.status), Some(201));
    assert!(h.store.is_empty().await);

    let sent = h.transport.sent().await;
    assert_eq!(sent[0].header("x-request-id"), Some("req-1"));
    assert_eq!(sent[0].header("content-type"), Some("application/json"));
}

#[tokio::test(flavor = "multi_thread")]
async fn gateway_errors_are_queued_and_returned() {
    for status in [502, 503, 504] {
        let h = harness(ScriptedTransport::new().respond(status), true);

        let outcome = h.gate.execute(complete_ticket()).await.unwrap();

        assert!(outcome.queued, "status {status}");
        assert_eq!(outcome.response.map(|r| r.status), Some(status));
        assert_eq!(h.store.len().await, 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn other_failures_are_returned_unqueued() {
    for status in [400, 409, 422, 500] {
        let h = harness(ScriptedTransport::new().respond(status), true);

        let outcome = h.gate.execute(complete_ticket()).await.unwrap();

        assert!(!outcome.queued, "status {status}");
        assert_eq!(outcome.response.map(|r| r.status), Some(status));
        assert!(h.store.is_empty().await);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_is_queued() {
    let h = harness(ScriptedTransport::new().fail("connection reset"), true);

    let outcome = h.gate.execute(complete_ticket()).await.unwrap();

    assert!(outcome.queued);
    assert!(outcome.response.is_none());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn queued_items_get_distinct_ids_in_call_order() {
    let h = harness(ScriptedTransport::new(), false);

    h.gate.execute(MutationRequest::new("/api/a")).await.unwrap();
    h.gate.execute(MutationRequest::new("/api/b")).await.unwrap();

    let queued = h.store.read_all().await;
    assert_eq!(queued.len(), 2);
    assert_ne!(queued[0].id, queued[1].id);
    assert_eq!(queued[0].target, "/api/a");
    assert_eq!(queued[1].target, "/api/b");
    assert_eq!(h.gate.pending_count().await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn caller_headers_are_not_replayed() {
    let h = harness(ScriptedTransport::new(), false);
    h.gate.execute(complete_ticket()).await.unwrap();

    h.connectivity.set_online(true);
    let engine = ReplayEngine::new(h.store.clone(), h.transport.clone(), h.connectivity.clone());
    engine.flush(&StaticTokenProvider::new("tok")).await.unwrap();

    let sent = h.transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].header("x-request-id").is_none());
    assert_eq!(sent[0].body, Some(json!({"notes": "replaced filter"})));
}

#[tokio::test(flavor = "multi_thread")]
async fn enqueue_notifies_listeners() {
    let h = harness(ScriptedTransport::new(), false);
    let mut rx = h.store.subscribe();

    h.gate.execute(MutationRequest::new("/api/a")).await.unwrap();

    assert_eq!(rx.recv().await.unwrap().count, 1);
}
