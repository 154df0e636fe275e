//! SQLite persistence for the mutation queue

pub mod manager;
pub mod mutation_queue_repository;

pub use manager::{DbManager, PooledConnection};
pub use mutation_queue_repository::SqliteMutationStore;
