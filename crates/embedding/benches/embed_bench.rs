use criterion::{black_box, criterion_group, criterion_main, Criterion};
use embedding::score;

const TEXT: &str = "the quarterly report shows steady growth across all regions";

fn bench_embedding(c: &mut Criterion) {
    c.bench_function("embedding_score", |b| b.iter(|| score(black_box(TEXT))));
}

criterion_group!(benches, bench_embedding);
criterion_main!(benches);
