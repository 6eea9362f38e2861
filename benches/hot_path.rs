//! Microbenchmarks for the per-tick hot path: chunk encoding, output-line
//! parsing, and command mapping.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vocmd::defaults;
use vocmd::pipeline::encode::{calculate_rms, encode_chunk};
use vocmd::stt::mapper::CommandMapper;
use vocmd::stt::parser::OutputParser;

fn make_chunk() -> Vec<f32> {
    (0..defaults::CHUNK_SAMPLES)
        .map(|i| ((i as f32) * 0.01).sin() * 0.4)
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let chunk = make_chunk();

    c.bench_function("encode_chunk", |b| {
        b.iter(|| encode_chunk(black_box(&chunk)))
    });

    c.bench_function("calculate_rms", |b| {
        b.iter(|| calculate_rms(black_box(&chunk)))
    });
}

fn bench_parse(c: &mut Criterion) {
    let denylist: Vec<String> = defaults::DENYLIST.iter().map(|d| d.to_string()).collect();
    let parser = OutputParser::new(&denylist);

    c.bench_function("parse_json_line", |b| {
        b.iter(|| parser.parse(black_box(r#"{"text":"one"}"#)))
    });

    c.bench_function("parse_single_quoted_line", |b| {
        b.iter(|| parser.parse(black_box(r#"{'text':'two'}"#)))
    });

    c.bench_function("parse_chatter_line", |b| {
        b.iter(|| parser.parse(black_box("size= 256KiB time=00:00:05.48 bitrate= 0.4kbits/s")))
    });
}

fn bench_map(c: &mut Criterion) {
    let mapper = CommandMapper::default();

    c.bench_function("map_exact", |b| b.iter(|| mapper.map(black_box("two."))));
    c.bench_function("map_unrecognized", |b| {
        b.iter(|| mapper.map(black_box("the quick brown fox")))
    });
}

criterion_group!(benches, bench_encode, bench_parse, bench_map);
criterion_main!(benches);
