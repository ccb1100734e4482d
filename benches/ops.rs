//! Micro-operation benchmarks across the four eviction policies.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures get-hit and insert latency under identical conditions, plus a
//! mixed workload with a skewed key sequence.

use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use loadcache::builder::{CacheBuilder, EvictionPolicy};
use loadcache::cache::Cache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CAPACITY: usize = 16_384;
const OPS: u64 = 100_000;

fn filled_cache(policy: EvictionPolicy) -> Cache<u64, u64> {
    let cache = CacheBuilder::new(CAPACITY).eviction_policy(policy).build();
    for i in 0..CAPACITY as u64 {
        cache.set(i, i).unwrap();
    }
    cache
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    for policy in EvictionPolicy::ALL {
        group.bench_function(policy.as_str(), |b| {
            b.iter_custom(|iters| {
                let cache = filled_cache(policy);
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % (CAPACITY as u64);
                        black_box(cache.get(&key).ok());
                    }
                }
                start.elapsed()
            })
        });
    }
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ns");
    group.throughput(Throughput::Elements(OPS));

    for policy in EvictionPolicy::ALL {
        group.bench_function(policy.as_str(), |b| {
            b.iter_custom(|iters| {
                let cache: Cache<u64, u64> =
                    CacheBuilder::new(CAPACITY).eviction_policy(policy).build();
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        black_box(cache.set(i, i).ok());
                    }
                }
                start.elapsed()
            })
        });
    }
    group.finish();
}

fn bench_mixed_skewed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_skewed_ns");
    group.throughput(Throughput::Elements(OPS));

    // Pre-generate a skewed key sequence: 90% of ops over 10% of keys.
    let mut rng = StdRng::seed_from_u64(42);
    let hot = (CAPACITY / 10) as u64;
    let keys: Vec<u64> = (0..OPS)
        .map(|_| {
            if rng.gen_bool(0.9) {
                rng.gen_range(0..hot)
            } else {
                rng.gen_range(0..(2 * CAPACITY as u64))
            }
        })
        .collect();

    for policy in EvictionPolicy::ALL {
        group.bench_function(policy.as_str(), |b| {
            b.iter_custom(|iters| {
                let cache = filled_cache(policy);
                let start = Instant::now();
                for _ in 0..iters {
                    for &key in &keys {
                        if cache.get(&key).is_err() {
                            let _ = cache.set(key, key);
                        }
                    }
                }
                start.elapsed()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_insert, bench_mixed_skewed);
criterion_main!(benches);
