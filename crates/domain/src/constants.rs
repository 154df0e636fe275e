//! Application constants
//!
//! Centralized location for the domain-level constants shared by the queue,
//! the replay engine and the conflict policy.

// Replay configuration
pub const MAX_REPLAY_ATTEMPTS: u32 = 8;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_ERROR_MESSAGE_LEN: usize = 512;

// Queue change notifications
pub const QUEUE_EVENT_CAPACITY: usize = 64;

// Store defaults
pub const DEFAULT_STORE_PATH: &str = "fieldsync-queue.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;

// Replay request headers
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_OFFLINE_REPLAY: &str = "x-offline-replay";
pub const HEADER_QUEUED_AT: &str = "x-queued-at";
pub const HEADER_CONFLICT_STRATEGY: &str = "x-conflict-strategy";
pub const CONFLICT_STRATEGY_LAST_WRITER_WINS: &str = "last-writer-wins";

// Server error codes with dedicated conflict handling
pub const TICKET_VERSION_CONFLICT: &str = "TICKET_VERSION_CONFLICT";
pub const CHECKLIST_NOT_FOUND: &str = "CHECKLIST_NOT_FOUND";
pub const INSPECTION_ITEM_CONFLICT: &str = "INSPECTION_ITEM_CONFLICT";
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN";

// Batch sync endpoint
pub const SYNC_BATCH_PATH: &str = "/api/sync/batch";
