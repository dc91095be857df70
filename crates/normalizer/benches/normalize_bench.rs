use criterion::{black_box, criterion_group, criterion_main, Criterion};
use normalizer::{normalize, NormalizerConfig};

const PLAIN: &str = "The quick brown fox jumps over the lazy dog. This is ordinary training data with no obfuscation at all, repeated a few times to pad out the length of the sample text.";

const ACCENTED: &str = "L'\u{00e9}l\u{00e9}phant mange des p\u{00e2}tisseries \u{00e0} c\u{00f4t\u{00e9}} du caf\u{00e9}, na\u{00ef}vement heureux, r\u{00e9}p\u{00e9}tant \u{00e7}a et l\u{00e0} sans souci particulier.";

fn bench_normalize(c: &mut Criterion) {
    let cfg = NormalizerConfig::default();

    c.bench_function("normalize_plain_ascii", |b| {
        b.iter(|| normalize(black_box(PLAIN), black_box(&cfg)).unwrap())
    });

    c.bench_function("normalize_accented_nfkd", |b| {
        b.iter(|| normalize(black_box(ACCENTED), black_box(&cfg)).unwrap())
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
