//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time/ticks
//! - Input events
//! - Frame scheduling
//! - Storage (LocalStorage on web)

pub mod input;
pub mod scheduler;
pub mod storage;
pub mod time;

pub use input::{ActivationLatch, InputAdapter, RawInput, RawKind, Routed, Signal};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use storage::{KeyValueStore, MemoryStorage};
pub use time::{Clock, ManualClock, format_timestamp};
