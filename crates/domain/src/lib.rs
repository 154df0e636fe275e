//! # FieldSync Domain
//!
//! Business domain types for the offline mutation queue.
//!
//! This crate contains:
//! - Queue records and caller requests (`QueuedMutation`, `MutationRequest`)
//! - Transport-neutral HTTP exchange types and flush summaries
//! - Conflict reports, resolutions and the batch sync wire format
//! - Domain error types, constants and configuration structures
//!
//! ## Architecture
//! - No dependencies on other FieldSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
