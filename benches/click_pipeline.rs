//! 点击采集热路径基准测试
//!
//! `capture` 位于重定向路径上，只做清洗与一次 `try_send`。

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use shortener::analytics::sanitize::{sanitize_ip, sanitize_user_agent};
use shortener::analytics::sink::LogSink;
use shortener::analytics::{ClickPipeline, PipelineSettings};

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("click/sanitize");

    group.bench_function("ip_forwarded_chain", |b| {
        b.iter(|| sanitize_ip(black_box(Some("203.0.113.7, 10.0.0.1, 10.0.0.2"))));
    });

    group.bench_function("ip_garbage", |b| {
        b.iter(|| sanitize_ip(black_box(Some("not-an-ip"))));
    });

    let long_ua = "Mozilla/5.0 ".repeat(100);
    group.bench_function("user_agent_truncate", |b| {
        b.iter(|| sanitize_user_agent(black_box(Some(long_ua.as_str()))));
    });

    group.finish();
}

fn bench_capture(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let pipeline = rt.block_on(async {
        Arc::new(ClickPipeline::new(
            Arc::new(LogSink),
            PipelineSettings {
                queue_capacity: 100_000,
                batch_size: 1000,
                flush_interval: Duration::from_millis(50),
                drain_on_shutdown: false,
                shutdown_timeout: Duration::from_secs(1),
            },
        ))
    });

    let mut group = c.benchmark_group("click/capture");
    group.bench_function("try_send", |b| {
        b.iter(|| {
            pipeline.capture(
                black_box("abc123"),
                black_box(Some("198.51.100.23")),
                black_box(Some("Mozilla/5.0 (X11; Linux x86_64)")),
            )
        });
    });
    group.finish();

    rt.block_on(pipeline.shutdown());
}

criterion_group!(benches, bench_sanitize, bench_capture);
criterion_main!(benches);
