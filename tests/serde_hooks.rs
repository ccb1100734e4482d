// Serialize/deserialize hook behavior: round-trips, error dispositions,
// and the interaction with loader-driven inserts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loadcache::builder::{CacheBuilder, EvictionPolicy};
use loadcache::cache::Cache;
use loadcache::error::{CacheError, HookError};

/// Reversible length-prefixed encoding: "v" -> "1#v".
fn encode(value: String) -> Result<String, HookError> {
    Ok(format!("{}#{}", value.len(), value))
}

fn decode(stored: String) -> Result<String, HookError> {
    let (length, rest) = stored
        .split_once('#')
        .ok_or_else(|| HookError::from("missing length prefix"))?;
    let length: usize = length.parse().map_err(|_| HookError::from("bad length"))?;
    if rest.len() != length {
        return Err("length mismatch".into());
    }
    Ok(rest.to_owned())
}

fn roundtrip_cache(policy: EvictionPolicy) -> Cache<String, String> {
    CacheBuilder::new(32)
        .eviction_policy(policy)
        .loader(|_ctx, _key: &String| Ok("value1".to_owned()))
        .serialize(|_key, value| encode(value))
        .deserialize(|_key, stored| decode(stored))
        .build()
}

#[test]
fn set_then_get_roundtrips_through_the_transforms() {
    for policy in EvictionPolicy::ALL {
        let cache = roundtrip_cache(policy);
        cache.set("key2".to_owned(), "value2".to_owned()).unwrap();
        assert_eq!(cache.get(&"key2".to_owned()).unwrap(), "value2", "{policy}");

        // The stored representation is the encoded form.
        let all = cache.get_all(false);
        assert_eq!(all.get("key2").map(String::as_str), Some("6#value2"));
    }
}

#[test]
fn loader_seeded_keys_roundtrip_too() {
    for policy in EvictionPolicy::ALL {
        let cache = roundtrip_cache(policy);

        // First read returns the loader's value directly; the entry is
        // stored encoded.
        assert_eq!(cache.get(&"key1".to_owned()).unwrap(), "value1", "{policy}");
        // Second read decodes the stored form back to the original.
        assert_eq!(cache.get(&"key1".to_owned()).unwrap(), "value1", "{policy}");
    }
}

#[test]
fn serialize_failure_aborts_the_write() {
    let added = Arc::new(AtomicUsize::new(0));
    let added_hook = added.clone();
    let cache: Cache<String, String> = CacheBuilder::new(8)
        .lru()
        .serialize(|_key, value: String| {
            if value == "poison" {
                Err("refusing to encode".into())
            } else {
                encode(value)
            }
        })
        .deserialize(|_key, stored| decode(stored))
        .on_added(move |_k, _v| {
            added_hook.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let err = cache
        .set("k".to_owned(), "poison".to_owned())
        .unwrap_err();
    assert!(matches!(err, CacheError::Serialize(_)));
    assert!(!cache.has(&"k".to_owned()));
    assert_eq!(cache.len(false), 0);
    assert_eq!(added.load(Ordering::SeqCst), 0);

    // A healthy write afterwards is unaffected.
    cache.set("k".to_owned(), "fine".to_owned()).unwrap();
    assert_eq!(cache.get(&"k".to_owned()).unwrap(), "fine");
}

#[test]
fn deserialize_failure_leaves_the_entry_and_is_not_a_miss() {
    let cache: Cache<String, String> = CacheBuilder::new(8)
        .lru()
        // No serialize hook: stored values lack the length prefix, so
        // decoding fails deterministically.
        .deserialize(|_key, stored| decode(stored))
        .build();

    cache.set("k".to_owned(), "raw".to_owned()).unwrap();
    let err = cache.get(&"k".to_owned()).unwrap_err();
    assert!(matches!(err, CacheError::Deserialize(_)));

    assert!(cache.has(&"k".to_owned()), "entry must survive the failed read");
    assert_eq!(cache.hit_count(), 1, "failed decode still counts the hit");
    assert_eq!(cache.miss_count(), 0);
}

#[test]
fn loader_value_rejected_by_serialize_reaches_no_one() {
    // Open-question behavior: when the loader succeeds but the subsequent
    // insert fails, the insert error is surfaced to the caller (and any
    // waiters) and nothing is stored.
    let cache: Cache<String, String> = CacheBuilder::new(8)
        .lru()
        .loader(|_ctx, _key: &String| Ok("poison".to_owned()))
        .serialize(|_key, value: String| {
            if value == "poison" {
                Err("refusing to encode".into())
            } else {
                encode(value)
            }
        })
        .build();

    let err = cache.get(&"k".to_owned()).unwrap_err();
    assert!(matches!(err, CacheError::Serialize(_)));
    assert!(!cache.has(&"k".to_owned()));
    assert_eq!(cache.len(false), 0);
}
