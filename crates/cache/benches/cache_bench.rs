use cache::PersistentCache;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_cache(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let cache = PersistentCache::open(dir.path().join("bench.redb")).unwrap();
    cache.set_embedding("hash", "model-a", "v1", vec![0.1f32; 384]).unwrap();

    c.bench_function("cache_get_embedding_hit", |b| {
        b.iter(|| cache.get_embedding(black_box("hash"), "model-a", "v1").unwrap())
    });
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
