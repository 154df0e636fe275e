//! Decides which classified conflicts reach the user's inbox

use fieldsync_domain::{ConflictResolution, ConflictResolutionResult};

/// True for conflicts that cannot be resolved without the user.
pub const fn needs_inbox_attention(result: &ConflictResolutionResult) -> bool {
    matches!(result.resolution, ConflictResolution::ManualReview | ConflictResolution::Dismiss)
}
