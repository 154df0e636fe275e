//! Online/offline signal consumed by the gate and the replay engine

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the device currently believes it has network access.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Shared flag flipped by the platform's online/offline notifications.
#[derive(Debug)]
pub struct ConnectivityFlag {
    online: AtomicBool,
}

impl ConnectivityFlag {
    pub const fn new(online: bool) -> Self {
        Self { online: AtomicBool::new(online) }
    }

    /// Store the new state and return the previous one.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}
