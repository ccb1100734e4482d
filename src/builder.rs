//! Fluent construction of caches with a chosen eviction policy.
//!
//! ## Example
//!
//! ```rust
//! use loadcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new(100).lru().build();
//! cache.set(1, "hello").unwrap();
//! assert_eq!(cache.get(&1).unwrap(), "hello");
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, Hooks, Listener, Loader, Transform};
use crate::clock::{Clock, SystemClock};
use crate::context::Context;
use crate::error::{ConfigError, HookError};
use crate::policy::Engine;

/// Available eviction policies.
///
/// Round-trips through the policy strings `"simple"`, `"lru"`, `"lfu"`
/// and `"arc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionPolicy {
    /// Unordered; unbounded when the size is zero.
    #[default]
    Simple,
    /// Least Recently Used.
    Lru,
    /// Least Frequently Used.
    Lfu,
    /// Adaptive Replacement Cache.
    Arc,
}

impl EvictionPolicy {
    /// All policies, in declaration order. Handy for test matrices.
    pub const ALL: [EvictionPolicy; 4] = [
        EvictionPolicy::Simple,
        EvictionPolicy::Lru,
        EvictionPolicy::Lfu,
        EvictionPolicy::Arc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Simple => "simple",
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Arc => "arc",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(EvictionPolicy::Simple),
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "arc" => Ok(EvictionPolicy::Arc),
            other => Err(ConfigError::new(format!(
                "unknown eviction policy {other:?}"
            ))),
        }
    }
}

/// Builder for [`Cache`] instances.
pub struct CacheBuilder<K, V> {
    size: usize,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
    expiration: Option<Duration>,
    loader: Option<Loader<K, V>>,
    on_added: Option<Listener<K, V>>,
    on_evicted: Option<Listener<K, V>>,
    on_purge_visit: Option<Listener<K, V>>,
    serialize: Option<Transform<K, V>>,
    deserialize: Option<Transform<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Starts a builder for a cache holding up to `size` entries. A size
    /// of zero is only valid for the Simple policy, where it means
    /// unbounded. The policy defaults to Simple.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            policy: EvictionPolicy::Simple,
            clock: Arc::new(SystemClock),
            expiration: None,
            loader: None,
            on_added: None,
            on_evicted: None,
            on_purge_visit: None,
            serialize: None,
            deserialize: None,
        }
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn simple(self) -> Self {
        self.eviction_policy(EvictionPolicy::Simple)
    }

    pub fn lru(self) -> Self {
        self.eviction_policy(EvictionPolicy::Lru)
    }

    pub fn lfu(self) -> Self {
        self.eviction_policy(EvictionPolicy::Lfu)
    }

    pub fn arc(self) -> Self {
        self.eviction_policy(EvictionPolicy::Arc)
    }

    /// Default time-to-live applied to every insert without an explicit
    /// TTL.
    pub fn expiration(mut self, ttl: Duration) -> Self {
        self.expiration = Some(ttl);
        self
    }

    /// Swaps the time source; useful with
    /// [`ManualClock`](crate::clock::ManualClock) in tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Read-through loader. Loaded entries fall back to the default
    /// expiration.
    pub fn loader<F>(self, loader: F) -> Self
    where
        F: Fn(&Context, &K) -> Result<V, HookError> + Send + Sync + 'static,
    {
        self.loader_with_expire(move |ctx, key| loader(ctx, key).map(|value| (value, None)))
    }

    /// Read-through loader that may override the TTL of the entry it
    /// produces; `None` falls back to the default expiration.
    pub fn loader_with_expire<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Context, &K) -> Result<(V, Option<Duration>), HookError> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Called after every successful insert or update, including
    /// loader-driven ones, with the stored value.
    pub fn on_added<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_added = Some(Arc::new(hook));
        self
    }

    /// Called for every entry removed by capacity pressure, lazy
    /// expiration, or [`Cache::remove`].
    pub fn on_evicted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Arc::new(hook));
        self
    }

    /// Called for every entry dropped by [`Cache::purge`].
    pub fn on_purge_visit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_purge_visit = Some(Arc::new(hook));
        self
    }

    /// Transform applied to values before they are stored.
    pub fn serialize<F>(mut self, transform: F) -> Self
    where
        F: Fn(&K, V) -> Result<V, HookError> + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(transform));
        self
    }

    /// Transform applied to stored values as `get` returns them.
    pub fn deserialize<F>(mut self, transform: F) -> Self
    where
        F: Fn(&K, V) -> Result<V, HookError> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(transform));
        self
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics when `size` is zero with a non-Simple policy; use
    /// [`try_build`](Self::try_build) for a fallible variant.
    pub fn build(self) -> Cache<K, V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("loadcache: {err}"),
        }
    }

    /// Builds the cache, reporting configuration problems instead of
    /// panicking.
    pub fn try_build(self) -> Result<Cache<K, V>, ConfigError> {
        if self.size == 0 && self.policy != EvictionPolicy::Simple {
            return Err(ConfigError::new(format!(
                "cache size must be > 0 for the {} policy",
                self.policy
            )));
        }
        let engine = Engine::new(self.policy, self.size);
        let hooks = Hooks {
            loader: self.loader,
            on_added: self.on_added,
            on_evicted: self.on_evicted,
            on_purge_visit: self.on_purge_visit,
            serialize: self.serialize,
            deserialize: self.deserialize,
        };
        Ok(Cache::new(engine, hooks, self.expiration, self.clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_strings_roundtrip() {
        for policy in EvictionPolicy::ALL {
            assert_eq!(policy.as_str().parse::<EvictionPolicy>(), Ok(policy));
            assert_eq!(policy.to_string(), policy.as_str());
        }
        assert!("mru".parse::<EvictionPolicy>().is_err());
    }

    #[test]
    fn default_policy_is_simple() {
        let cache: crate::cache::Cache<u32, u32> = CacheBuilder::new(4).build();
        assert_eq!(cache.policy(), EvictionPolicy::Simple);
    }

    #[test]
    fn try_build_rejects_zero_size_for_bounded_policies() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Lfu, EvictionPolicy::Arc] {
            let result = CacheBuilder::<u32, u32>::new(0)
                .eviction_policy(policy)
                .try_build();
            let err = result.err().expect("zero size must be rejected");
            assert!(err.message().contains(policy.as_str()));
        }
    }

    #[test]
    #[should_panic(expected = "cache size must be > 0")]
    fn build_panics_on_zero_size_lru() {
        let _ = CacheBuilder::<u32, u32>::new(0).lru().build();
    }

    #[test]
    fn zero_size_simple_is_unbounded() {
        let cache = CacheBuilder::new(0).simple().build();
        for i in 0..500 {
            cache.set(i, i).unwrap();
        }
        assert_eq!(cache.len(false), 500);
    }

    #[test]
    fn all_policies_build_and_serve() {
        for policy in EvictionPolicy::ALL {
            let cache = CacheBuilder::new(4).eviction_policy(policy).build();
            cache.set(1, "one").unwrap();
            assert_eq!(cache.get(&1).unwrap(), "one", "{policy}");
            assert_eq!(cache.policy(), policy);
        }
    }
}
