//! Wire format of the batch sync endpoint (`POST /api/sync/batch`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncBatchRequest {
    pub items: Vec<SyncBatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncBatchItem {
    pub queue_item_id: String,
    pub idempotency_key: String,
    pub operation: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_version_etag: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBatchResponse {
    pub results: Vec<SyncItemResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItemResult {
    pub queue_item_id: String,
    pub status: SyncItemStatus,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemStatus {
    Accepted,
    Duplicate,
    Conflict,
    Error,
}

crate::impl_domain_status_conversions!(SyncItemStatus {
    Accepted => "accepted",
    Duplicate => "duplicate",
    Conflict => "conflict",
    Error => "error",
});

impl SyncItemStatus {
    /// Statuses that must go through the conflict policy.
    pub const fn needs_resolution(self) -> bool {
        matches!(self, Self::Conflict | Self::Error)
    }
}
