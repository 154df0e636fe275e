//! HTTP transport for replayed and immediate mutations

pub mod client;

pub use client::{HttpTransport, HttpTransportBuilder};
