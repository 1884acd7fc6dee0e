//! Protocol encoding/decoding benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gordon_protocol::{
    Decoder, Encoder, Frame, Metadata, Page, PageRef, Predicate, Relationship, Request, Section,
    MAX_PAYLOAD_SIZE,
};
use uuid::Uuid;

fn create_test_request(args: usize) -> Request {
    (0..args).fold(Request::read(Uuid::new_v4()), |req, i| {
        req.with_arg(format!("arg-{}", i), "x".repeat(32))
    })
}

fn create_test_page(sections: usize) -> Page {
    let id = Uuid::new_v4();
    let mut page = Page::new(Metadata::now(id, "bench"), "Benchmark Page");
    page.preamble = "A page used for benchmarking".to_string();
    page.history = (0..4).map(|_| Metadata::now(id, "bench")).collect();
    page.sections = (0..sections)
        .map(|i| Section::new(format!("Section {}", i), "x".repeat(256)))
        .collect();
    page.tags = vec!["bench".to_string(), "protocol".to_string()];
    page.labels.insert("kind".to_string(), "bench".to_string());
    page.links = (0..sections)
        .map(|_| PageRef::to_page(Uuid::new_v4()))
        .collect();
    page.relationships = vec![Relationship::new(
        PageRef::to_page(id),
        Predicate::Extends,
        PageRef::to_page(Uuid::new_v4()),
    )];
    page
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for size in [100, 1000, 10000] {
        let frame = Frame::new(Bytes::from("x".repeat(size)));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| black_box(frame.encode().unwrap()));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for size in [100, 1000, 10000] {
        let encoded = Frame::new(Bytes::from("x".repeat(size))).encode().unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut buf = encoded.clone();
                black_box(Frame::decode(&mut buf, MAX_PAYLOAD_SIZE).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_request_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_encode");

    for args in [0, 8, 64] {
        let request = create_test_request(args);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(args), &request, |b, request| {
            b.iter(|| black_box(Encoder::encode_request(request).unwrap()));
        });
    }

    group.finish();
}

fn bench_request_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_decode");

    for args in [0, 8, 64] {
        let encoded = Encoder::encode_request(&create_test_request(args)).unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(args), &encoded, |b, encoded| {
            b.iter(|| {
                let mut decoder = Decoder::new();
                decoder.extend(encoded);
                black_box(decoder.decode_request().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_page_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_encode");

    for sections in [1, 16, 128] {
        let page = create_test_page(sections);
        let size = Encoder::encode_page(&page).unwrap().len();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &page, |b, page| {
            b.iter(|| black_box(Encoder::encode_page(page).unwrap()));
        });
    }

    group.finish();
}

fn bench_page_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_decode");

    for sections in [1, 16, 128] {
        let encoded = Encoder::encode_page(&create_test_page(sections)).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let mut decoder = Decoder::new();
                    decoder.extend(encoded);
                    black_box(decoder.decode_page().unwrap())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_request_encode,
    bench_request_decode,
    bench_page_encode,
    bench_page_decode,
);

criterion_main!(benches);
