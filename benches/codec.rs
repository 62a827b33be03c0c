//! 短码编解码与校验基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use shortener::utils::base62;
use shortener::utils::url_validator::{is_valid_short_code, normalize_url, validate_custom_alias};

// ============== base62 ==============

fn bench_base62(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/base62");

    for value in [0u64, 12_345, 56_800_235_583, u64::MAX] {
        group.bench_with_input(BenchmarkId::new("encode", value), &value, |b, v| {
            b.iter(|| base62::encode(black_box(*v)));
        });

        let encoded = base62::encode(value);
        group.bench_with_input(BenchmarkId::new("decode", &encoded), &encoded, |b, s| {
            b.iter(|| base62::decode(black_box(s)).unwrap());
        });
    }

    group.finish();
}

// ============== 校验 ==============

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/validation");

    group.bench_function("short_code_valid", |b| {
        b.iter(|| assert!(is_valid_short_code(black_box("aZ3_x-9"))));
    });

    group.bench_function("short_code_invalid", |b| {
        b.iter(|| assert!(!is_valid_short_code(black_box("'; DROP TABLE--"))));
    });

    group.bench_function("alias_reserved", |b| {
        b.iter(|| assert!(validate_custom_alias(black_box("Metrics")).is_err()));
    });

    group.bench_function("normalize_bare_host", |b| {
        b.iter(|| normalize_url(black_box("example.com/path/")).unwrap());
    });

    group.bench_function("normalize_with_query", |b| {
        b.iter(|| {
            normalize_url(black_box("https://example.com/a/b/?utm_source=x#frag")).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_base62, bench_validation);
criterion_main!(benches);
