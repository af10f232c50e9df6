//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic millisecond clock)
//! - Storage (LocalStorage on web, a JSON file on native)

pub mod clock;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{KeyValueStore, MemoryStore, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
