//! Enqueue gate: send now, or defer into the durable queue

use std::sync::Arc;

use fieldsync_domain::{
    EnqueueOutcome, MutationRequest, OutboundRequest, QueuedMutation, Result, StatusClass,
};
use tracing::{debug, info, instrument, warn};

use super::ports::{MutationStore, MutationTransport};
use crate::connectivity::ConnectivityProbe;

/// Entry point for every application write.
///
/// Offline writes and writes that fail in transit are appended to the queue.
/// Gateway errors (502/503/504) are queued as well, while the caller still
/// receives the server's response. Every other response is returned as-is.
pub struct EnqueueGate {
    store: Arc<dyn MutationStore>,
    transport: Arc<dyn MutationTransport>,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl EnqueueGate {
    pub fn new(
        store: Arc<dyn MutationStore>,
        transport: Arc<dyn MutationTransport>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self { store, transport, connectivity }
    }

    /// Perform `request` now if possible, deferring it otherwise.
    ///
    /// Only store failures surface as errors; transport failures turn into a
    /// queued outcome.
    #[instrument(skip(self, request), fields(method = %request.method, target = %request.target))]
    pub async fn execute(&self, request: MutationRequest) -> Result<EnqueueOutcome> {
        if !self.connectivity.is_online() {
            debug!("Device offline; deferring mutation");
            self.enqueue(&request).await?;
            return Ok(EnqueueOutcome::deferred());
        }

        match self.transport.send(&OutboundRequest::from(&request)).await {
            Ok(response) => match response.class() {
                StatusClass::GatewayTransient => {
                    warn!(status = response.status, "Gateway unavailable; deferring mutation");
                    self.enqueue(&request).await?;
                    Ok(EnqueueOutcome::deferred_with(response))
                }
                _ => Ok(EnqueueOutcome::completed(response)),
            },
            Err(err) => {
                warn!(error = %err, "Mutation failed in transit; deferring");
                self.enqueue(&request).await?;
                Ok(EnqueueOutcome::deferred())
            }
        }
    }

    /// Append `request` to the queue without attempting delivery.
    pub async fn enqueue(&self, request: &MutationRequest) -> Result<QueuedMutation> {
        let mutation = QueuedMutation::from_request(request);
        let pending = self.store.append(&mutation).await?;
        info!(mutation_id = %mutation.id, pending, "Queued offline mutation");
        Ok(mutation)
    }

    pub async fn pending_count(&self) -> usize {
        self.store.len().await
    }
}
