//! Benchmark for the permutation engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use permutor_core::{permutations, Candidate};

fn bench_permutations(c: &mut Criterion) {
    let eight = Candidate::new((1u8..=8).collect()).unwrap();
    c.bench_function("permutations/8-distinct", |b| {
        b.iter(|| {
            let count = permutations(black_box(&eight)).count();
            assert_eq!(count, 40_320);
        })
    });

    let repeated = Candidate::new(vec![1, 1, 1, 2, 2, 3, 4, 5]).unwrap();
    c.bench_function("permutations/8-with-repeats", |b| {
        b.iter(|| permutations(black_box(&repeated)).count())
    });
}

criterion_group!(benches, bench_permutations);
criterion_main!(benches);
