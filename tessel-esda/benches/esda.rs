use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessel_esda::{join_counts_test, local_moran, median_split, moran_test, PermutationConfig};
use tessel_weights::{lattice, Contiguity};

fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn bench_moran(c: &mut Criterion) {
    let mut group = c.benchmark_group("moran");

    let w = lattice(30, 30, Contiguity::Queen).unwrap().row_standardized();
    let values = random_f64(900, 42);
    let config = PermutationConfig::default();

    group.bench_function("30x30_queen_999perm", |b| {
        b.iter(|| moran_test(black_box(&values), &w, &config))
    });

    group.finish();
}

fn bench_local_moran(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_moran");
    group.sample_size(10);

    let w = lattice(20, 20, Contiguity::Queen).unwrap().row_standardized();
    let values = random_f64(400, 7);
    let config = PermutationConfig::default();

    group.bench_function("20x20_queen_999perm", |b| {
        b.iter(|| local_moran(black_box(&values), &w, &config))
    });

    group.finish();
}

fn bench_join_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_counts");

    let w = lattice(30, 30, Contiguity::Rook).unwrap();
    let labels = median_split(&random_f64(900, 137)).unwrap();
    let config = PermutationConfig::default();

    group.bench_function("30x30_rook_999perm", |b| {
        b.iter(|| join_counts_test(black_box(&labels), &w, &config))
    });

    group.finish();
}

criterion_group!(benches, bench_moran, bench_local_moran, bench_join_counts);
criterion_main!(benches);
