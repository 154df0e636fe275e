//! # FieldSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the durable queue, the HTTP transport, access
//!   tokens and connectivity
//! - The enqueue gate that decides between sending now and deferring
//! - The replay engine that drains the queue once the device is back online
//! - The conflict classifier and the inbox gate
//!
//! ## Architecture Principles
//! - Only depends on `fieldsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod conflict;
pub mod connectivity;
pub mod queue;

pub use conflict::{classify, needs_inbox_attention, reported_conflicts};
pub use connectivity::{ConnectivityFlag, ConnectivityProbe};
pub use queue::gate::EnqueueGate;
pub use queue::memory::InMemoryMutationStore;
pub use queue::notifier::{QueueChanged, QueueNotifier};
pub use queue::ports::{MutationStore, MutationTransport, StaticTokenProvider, TokenProvider};
pub use queue::replay::ReplayEngine;
