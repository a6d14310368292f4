#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

const BENCH_SEED: u64 = 0xF10_5EED;

/// Shared criterion setup: short runs, small sample counts.
pub fn flora_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(20)
        .warm_up_time(Duration::from_millis(750))
        .measurement_time(Duration::from_secs(3))
}

/// Reproducible RNG per benchmark parameter.
pub fn bench_rng(salt: u64) -> StdRng {
    StdRng::seed_from_u64(BENCH_SEED ^ salt.rotate_left(17))
}

/// Throughput in produced items; never zero so criterion can report rates.
pub fn items(count: usize) -> Throughput {
    Throughput::Elements(count.max(1) as u64)
}
