//! Extracts per-item conflicts from batch sync responses

use fieldsync_domain::constants::UNKNOWN_ERROR_CODE;
use fieldsync_domain::{
    HttpResponse, QueuedMutation, SyncBatchItem, SyncBatchRequest, SyncBatchResponse,
    SyncConflict, SyncItemResult,
};
use tracing::debug;

/// Conflicts the server reported inside a successful batch sync exchange.
///
/// Returns an empty list unless the queued body is a batch request and the
/// response body is a batch result. Results with status `conflict` or `error`
/// are paired with their request item by `queue_item_id`.
pub fn reported_conflicts(mutation: &QueuedMutation, response: &HttpResponse) -> Vec<SyncConflict> {
    let Some(body) = mutation.body.as_ref() else {
        return Vec::new();
    };
    let Ok(request) = serde_json::from_value::<SyncBatchRequest>(body.clone()) else {
        return Vec::new();
    };
    let Ok(reply) = serde_json::from_slice::<SyncBatchResponse>(&response.body) else {
        debug!(mutation_id = %mutation.id, "Batch response body not parseable; skipping conflict report");
        return Vec::new();
    };

    reply
        .results
        .into_iter()
        .filter(|result| result.status.needs_resolution())
        .map(|result| {
            let item = request.items.iter().find(|item| item.queue_item_id == result.queue_item_id);
            to_conflict(result, item)
        })
        .collect()
}

fn to_conflict(result: SyncItemResult, item: Option<&SyncBatchItem>) -> SyncConflict {
    let mut conflict = SyncConflict::new(
        item.map(|item| item.operation.clone()).unwrap_or_default(),
        result.error_code.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned()),
    )
    .with_queue_item(result.queue_item_id)
    .with_message(result.error_message.unwrap_or_default());

    if let Some(item) = item {
        conflict = conflict
            .with_entity(item.entity_type.clone(), item.entity_id.clone())
            .with_versions(item.base_version_etag.clone(), None);
    }
    conflict
}
