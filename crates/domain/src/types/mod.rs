//! Domain types and models

pub mod batch;
pub mod conflict;
pub mod http;
pub mod mutation;

pub use batch::{SyncBatchItem, SyncBatchRequest, SyncBatchResponse, SyncItemResult, SyncItemStatus};
pub use conflict::{ClassifiedConflict, ConflictResolution, ConflictResolutionResult, SyncConflict};
pub use http::{EnqueueOutcome, FlushSummary, HttpResponse, OutboundRequest, StatusClass};
pub use mutation::{HttpMethod, MutationId, MutationRequest, QueuedMutation};
