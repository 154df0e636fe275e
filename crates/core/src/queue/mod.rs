//! Offline mutation queue: ports, the enqueue gate and the replay engine

pub mod gate;
pub mod memory;
pub mod notifier;
pub mod ports;
pub mod replay;
