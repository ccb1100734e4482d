//! Convenience re-exports of the commonly used types.

pub use crate::builder::{CacheBuilder, EvictionPolicy};
pub use crate::cache::{ArcSnapshot, Cache, Listener, Loader, Transform};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::context::Context;
pub use crate::error::{CacheError, ConfigError, HookError};
pub use crate::stats::CacheStats;
