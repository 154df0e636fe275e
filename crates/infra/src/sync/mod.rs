//! Background replay for the durable mutation queue
//!
//! The worker follows the same runtime rules as every long-lived task here:
//! explicit lifecycle management, join handle tracking and cancellation
//! support.

pub mod replay_worker;

pub use replay_worker::{ReplayWorker, ReplayWorkerConfig};
