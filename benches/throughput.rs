//! Throughput benchmarks for squeeze.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use squeeze::chunker::Chunker;
use squeeze::config::ApiMode;
use squeeze::request::{build_body, StreamAccumulator};

fn benchmark_chunking(c: &mut Criterion) {
    let input = vec![b'x'; 1024 * 1024];
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("chunking");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("chunk_1mb", |b| {
        b.to_async(&rt).iter(|| {
            let input = input.clone();
            async move {
                let chunks = Chunker::new(&input[..], 4000)
                    .read_all(|_| {})
                    .await
                    .unwrap();
                assert!(!chunks.is_empty());
            }
        });
    });

    group.finish();
}

fn benchmark_stream_parsing(c: &mut Criterion) {
    let mut body = String::new();
    for _ in 0..99 {
        body.push_str("{\"response\":\"some generated text \",\"done\":false}\n");
    }
    body.push_str("{\"response\":\"the end\",\"done\":true}\n");

    let mut group = c.benchmark_group("parsing");
    group.throughput(Throughput::Bytes(body.len() as u64));

    group.bench_function("parse_stream_100_lines", |b| {
        b.iter(|| {
            let mut acc = StreamAccumulator::new();
            acc.push(body.as_bytes()).unwrap();
            acc.finish().unwrap()
        });
    });

    group.finish();
}

fn benchmark_request_building(c: &mut Criterion) {
    let chunk_text = "lorem ipsum ".repeat(300);

    let mut group = c.benchmark_group("request");
    group.throughput(Throughput::Elements(1));

    group.bench_function("build_generate_body", |b| {
        b.iter(|| build_body(ApiMode::Generate, "llama3.2", &chunk_text).unwrap());
    });

    group.bench_function("build_chat_body", |b| {
        b.iter(|| build_body(ApiMode::Chat, "llama3.2", &chunk_text).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_chunking,
    benchmark_stream_parsing,
    benchmark_request_building
);
criterion_main!(benches);
