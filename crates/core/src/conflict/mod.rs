//! Conflict classification for server-reported sync problems

pub mod inbox;
pub mod policy;
pub mod report;

pub use inbox::needs_inbox_attention;
pub use policy::classify;
pub use report::reported_conflicts;
