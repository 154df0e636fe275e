//! Replay engine: drains the queue in order once connectivity returns

use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;
use fieldsync_domain::constants::{
    CONFLICT_STRATEGY_LAST_WRITER_WINS, HEADER_AUTHORIZATION, HEADER_CONFLICT_STRATEGY,
    HEADER_OFFLINE_REPLAY, HEADER_QUEUED_AT, MAX_ERROR_MESSAGE_LEN, MAX_REPLAY_ATTEMPTS,
};
use fieldsync_domain::{
    ClassifiedConflict, FieldSyncError, FlushSummary, HttpResponse, OutboundRequest,
    QueuedMutation, ReplayConfig, Result, StatusClass,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::{MutationStore, MutationTransport, TokenProvider};
use crate::conflict::{classify, needs_inbox_attention, reported_conflicts};
use crate::connectivity::ConnectivityProbe;

/// Replays queued mutations oldest-first.
///
/// Each pass works on a snapshot of the queue taken when it starts and stops
/// early when connectivity drops or a send fails in transit. Concurrent calls
/// to [`ReplayEngine::flush`] run one after the other.
///
/// A send that outlives the optional send timeout is a transport failure: it
/// is recorded against the item and counts toward the attempt ceiling.
pub struct ReplayEngine {
    store: Arc<dyn MutationStore>,
    transport: Arc<dyn MutationTransport>,
    connectivity: Arc<dyn ConnectivityProbe>,
    max_attempts: u32,
    send_timeout: Option<Duration>,
    flush_lock: Mutex<()>,
}

enum Disposition {
    Delivered,
    Rejected,
    Retry(String),
}

impl ReplayEngine {
    pub fn new(
        store: Arc<dyn MutationStore>,
        transport: Arc<dyn MutationTransport>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            store,
            transport,
            connectivity,
            max_attempts: MAX_REPLAY_ATTEMPTS,
            send_timeout: None,
            flush_lock: Mutex::new(()),
        }
    }

    /// Apply the `replay` configuration section: attempt ceiling and the
    /// per-send timeout.
    #[must_use]
    pub fn with_config(self, config: &ReplayConfig) -> Self {
        self.with_max_attempts(config.max_attempts).with_send_timeout(config.flush_timeout())
    }

    /// Override the attempt ceiling (minimum 1).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Bound every replayed send; an expired send fails with a network error.
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout
    }

    /// Run one replay pass.
    ///
    /// Returns an idle summary without sending anything when the queue is
    /// empty or the device is offline. Store failures abort the pass.
    #[instrument(skip_all, fields(max_attempts = self.max_attempts))]
    pub async fn flush(&self, tokens: &dyn TokenProvider) -> Result<FlushSummary> {
        let _pass = self.flush_lock.lock().await;

        let snapshot = self.store.read_all().await;
        if snapshot.is_empty() || !self.connectivity.is_online() {
            debug!(pending = snapshot.len(), "Nothing to replay");
            return Ok(FlushSummary::idle(snapshot.len()));
        }

        info!(pending = snapshot.len(), "Starting replay pass");
        let mut summary = FlushSummary::default();

        for mutation in snapshot {
            if !self.connectivity.is_online() {
                info!("Connectivity lost; ending replay pass");
                break;
            }

            summary.processed += 1;
            let token = tokens.access_token().await;
            let request = replay_request(&mutation, token.as_deref());

            match self.send_resolving_conflict(request, &mut summary).await {
                Ok(response) => match disposition(&response) {
                    Disposition::Delivered => {
                        let reported = classify_reported(&mutation, &response);
                        summary.reported_conflicts.extend(reported);
                        self.drop_item(&mutation).await?;
                        summary.succeeded += 1;
                        debug!(mutation_id = %mutation.id, status = response.status, "Replayed mutation");
                    }
                    Disposition::Rejected => {
                        warn!(
                            mutation_id = %mutation.id,
                            status = response.status,
                            "Server rejected queued mutation; dropping"
                        );
                        self.drop_item(&mutation).await?;
                        summary.failed += 1;
                    }
                    Disposition::Retry(reason) => {
                        self.record_failure(mutation, reason, &mut summary).await?;
                    }
                },
                Err(err) => {
                    warn!(mutation_id = %mutation.id, error = %err, "Replay send failed; ending pass");
                    self.record_failure(mutation, err.to_string(), &mut summary).await?;
                    break;
                }
            }
        }

        summary.remaining = self.store.len().await;
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            conflicts = summary.conflicts,
            abandoned = summary.abandoned,
            remaining = summary.remaining,
            "Replay pass finished"
        );
        Ok(summary)
    }

    /// Send once; on 409/412 count a conflict and resend exactly once with the
    /// last-writer-wins strategy header.
    async fn send_resolving_conflict(
        &self,
        request: OutboundRequest,
        summary: &mut FlushSummary,
    ) -> Result<HttpResponse> {
        let response = self.send(&request).await?;
        if !response.is_conflict() {
            return Ok(response);
        }

        summary.conflicts += 1;
        debug!(status = response.status, "Conflict on replay; retrying as last-writer-wins");
        let retry =
            request.with_header(HEADER_CONFLICT_STRATEGY, CONFLICT_STRATEGY_LAST_WRITER_WINS);
        self.send(&retry).await
    }

    async fn send(&self, request: &OutboundRequest) -> Result<HttpResponse> {
        let Some(limit) = self.send_timeout else {
            return self.transport.send(request).await;
        };

        tokio::time::timeout(limit, self.transport.send(request)).await.map_err(|_| {
            FieldSyncError::Network(format!(
                "replay send timed out after {}ms",
                limit.as_millis()
            ))
        })?
    }

    async fn record_failure(
        &self,
        mut mutation: QueuedMutation,
        reason: String,
        summary: &mut FlushSummary,
    ) -> Result<()> {
        mutation.record_failure(truncate_reason(reason));

        if mutation.has_exhausted(self.max_attempts) {
            warn!(
                mutation_id = %mutation.id,
                target = %mutation.target,
                attempts = mutation.attempts,
                last_error = mutation.last_error.as_deref().unwrap_or_default(),
                "Abandoning mutation after reaching attempt ceiling"
            );
            self.drop_item(&mutation).await?;
            summary.abandoned += 1;
            return Ok(());
        }

        match self.store.update(&mutation).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(mutation_id = %mutation.id, "Mutation left the queue during replay");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn drop_item(&self, mutation: &QueuedMutation) -> Result<()> {
        match self.store.remove(&mutation.id).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(mutation_id = %mutation.id, "Mutation already removed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn classify_reported(mutation: &QueuedMutation, response: &HttpResponse) -> Vec<ClassifiedConflict> {
    reported_conflicts(mutation, response)
        .into_iter()
        .map(|conflict| {
            let result = classify(&conflict);
            if needs_inbox_attention(&result) {
                warn!(
                    queue_item_id = %conflict.queue_item_id,
                    operation = %conflict.operation,
                    error_code = %conflict.error_code,
                    resolution = %result.resolution,
                    "Sync conflict needs user attention"
                );
            }
            ClassifiedConflict { conflict, result }
        })
        .collect()
}

fn disposition(response: &HttpResponse) -> Disposition {
    match response.class() {
        StatusClass::Success => Disposition::Delivered,
        StatusClass::ClientRejection => Disposition::Rejected,
        StatusClass::Conflict | StatusClass::GatewayTransient | StatusClass::Retryable => {
            Disposition::Retry(format!("HTTP {}", response.status))
        }
    }
}

/// Rebuild the HTTP call for a queued item. Caller headers were never stored,
/// so only the replay headers are sent.
fn replay_request(mutation: &QueuedMutation, token: Option<&str>) -> OutboundRequest {
    let mut request = OutboundRequest::json(mutation.method, &mutation.target, mutation.body.clone());
    if let Some(token) = token {
        request = request.with_header(HEADER_AUTHORIZATION, format!("Bearer {token}"));
    }
    request
        .with_header(HEADER_OFFLINE_REPLAY, "1")
        .with_header(
            HEADER_QUEUED_AT,
            mutation.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
}

fn truncate_reason(reason: String) -> String {
    if reason.len() <= MAX_ERROR_MESSAGE_LEN {
        return reason;
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &reason[..end])
}
