#![warn(clippy::pedantic)]

pub mod memory;
pub mod memory_log;
pub mod snapshot;

pub use memory::MemoryStore;
pub use memory_log::MemoryLog;
pub use snapshot::{Snapshot, SnapshotError};
