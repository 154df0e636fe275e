//! # FieldSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Durable queue stores (SQLite through an r2d2 pool, or a JSON file)
//! - The reqwest-backed mutation transport
//! - Configuration loading from environment variables and files
//! - The background replay worker
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `fieldsync-core`
//! - Depends on `fieldsync-domain` and `fieldsync-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;
pub mod sync;

// Re-export commonly used items
pub use database::{DbManager, SqliteMutationStore};
pub use errors::InfraError;
pub use http::{HttpTransport, HttpTransportBuilder};
pub use observability::init_tracing;
pub use storage::{open_store, JsonFileMutationStore};
pub use sync::{ReplayWorker, ReplayWorkerConfig};
