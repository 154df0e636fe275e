//! Conflict reports and their policy-assigned resolutions

use serde::{Deserialize, Serialize};

/// A server-reported problem with one synced item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncConflict {
    pub queue_item_id: String,
    /// Namespaced operation, e.g. `ticket.complete`.
    pub operation: String,
    pub entity_type: String,
    pub entity_id: String,
    pub error_code: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
}

impl SyncConflict {
    pub fn new(operation: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self { operation: operation.into(), error_code: error_code.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_queue_item(mut self, queue_item_id: impl Into<String>) -> Self {
        self.queue_item_id = queue_item_id.into();
        self
    }

    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self.entity_id = entity_id.into();
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    #[must_use]
    pub fn with_versions(mut self, client: Option<String>, server: Option<String>) -> Self {
        self.client_version = client;
        self.server_version = server;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    Retry,
    Dismiss,
    ManualReview,
}

crate::impl_domain_status_conversions!(ConflictResolution {
    Retry => "retry",
    Dismiss => "dismiss",
    ManualReview => "manual_review",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolutionResult {
    pub resolution: ConflictResolution,
    pub reason: String,
    pub can_auto_resolve: bool,
}

impl ConflictResolutionResult {
    pub fn retry(reason: impl Into<String>) -> Self {
        Self { resolution: ConflictResolution::Retry, reason: reason.into(), can_auto_resolve: true }
    }

    pub fn dismiss(reason: impl Into<String>) -> Self {
        Self {
            resolution: ConflictResolution::Dismiss,
            reason: reason.into(),
            can_auto_resolve: true,
        }
    }

    pub fn manual_review(reason: impl Into<String>) -> Self {
        Self {
            resolution: ConflictResolution::ManualReview,
            reason: reason.into(),
            can_auto_resolve: false,
        }
    }
}

/// A reported conflict paired with the resolution the policy assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedConflict {
    pub conflict: SyncConflict,
    pub result: ConflictResolutionResult,
}
