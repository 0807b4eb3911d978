use criterion::{criterion_group, criterion_main, Criterion};
use ndmazes::MazeEngine;

fn generated(sizes: &[usize]) -> MazeEngine {
    let engine = MazeEngine::with_seed(sizes.len(), 11).unwrap();
    engine.set_size(sizes).unwrap();
    engine.generate(None, None).unwrap();
    engine
}

fn bench_write_64x64x4(c: &mut Criterion) {
    let engine = generated(&[64, 64, 4]);
    c.bench_function("write_64x64x4", move |b| {
        b.iter(|| engine.to_bytes().unwrap())
    });
}

fn bench_read_64x64x4(c: &mut Criterion) {
    let bytes = generated(&[64, 64, 4]).to_bytes().unwrap();
    c.bench_function("read_64x64x4", move |b| {
        b.iter(|| MazeEngine::from_bytes(&bytes).unwrap())
    });
}

criterion_group!(benches, bench_write_64x64x4, bench_read_64x64x4);
criterion_main!(benches);
