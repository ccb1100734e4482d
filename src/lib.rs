//! loadcache: an in-process key/value cache with interchangeable eviction
//! policies behind one handle.
//!
//! Four engines share the same contract: Simple (unordered, optionally
//! unbounded), LRU, LFU, and ARC. On top of them the cache offers
//! per-item expiration with lazy removal, read-through loading with
//! single-flight coalescing, optional serialize/deserialize hooks around
//! stored values, lifecycle callbacks, and hit/miss statistics.
//!
//! ```rust
//! use loadcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new(128).lru().build();
//! cache.set("a", 1).unwrap();
//! assert_eq!(cache.get(&"a").unwrap(), 1);
//! assert_eq!(cache.hit_rate(), 1.0);
//! ```
//!
//! With a loader, concurrent misses on one key collapse into a single
//! invocation whose outcome every caller observes:
//!
//! ```rust
//! use loadcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new(128)
//!     .lru()
//!     .loader(|_ctx, key: &u32| Ok(key * 2))
//!     .build();
//! assert_eq!(cache.get(&21).unwrap(), 42);
//! ```

pub mod builder;
pub mod cache;
pub mod clock;
pub mod context;
pub mod error;
pub mod prelude;
pub mod stats;

mod ds;
mod policy;
mod single_flight;
