use std::hint::black_box;
use bencher::{FixtureSize, RequestFixture};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_proxy_http::codec::{ParseEvents, ParseState, RequestParser};
use micro_proxy_http::protocol::{ParseError, RequestLine};

static SMALL_HEADER: RequestFixture =
    RequestFixture::new("get_small", FixtureSize::Small, include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: RequestFixture =
    RequestFixture::new("get_large", FixtureSize::Large, include_str!("../resources/request/get_large.txt"));

const PIPELINE_DEPTH: usize = 16;

/// Touches every slice the parser hands out, like a handler would.
#[derive(Default)]
struct SumEvents {
    bytes: usize,
}

impl ParseEvents for SumEvents {
    fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError> {
        self.bytes += line.target().len();
        Ok(())
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        self.bytes += name.len() + value.len();
        Ok(())
    }

    fn on_headers_complete(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}

fn benchmark_request_parser(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_parser");

    for fixture in [SMALL_HEADER, LARGE_HEADER] {
        group.throughput(Throughput::Bytes(fixture.bytes().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture| {
            let mut parser = RequestParser::new();
            b.iter_batched_ref(
                SumEvents::default,
                |events| {
                    parser.reset();
                    let progress = parser.parse(fixture.bytes(), events).expect("input should be a valid http request head");
                    black_box((progress, events.bytes));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Feeds the large head a few bytes at a time, the way slow clients deliver it.
fn benchmark_split_reads(criterion: &mut Criterion) {
    let content = LARGE_HEADER.bytes();
    let mut group = criterion.benchmark_group("request_parser_split");
    group.throughput(Throughput::Bytes(content.len() as u64));

    for read_size in [16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(read_size), &read_size, |b, &read_size| {
            let mut parser = RequestParser::new();
            let mut buffer = Vec::with_capacity(content.len());
            b.iter(|| {
                parser.reset();
                buffer.clear();
                let mut events = SumEvents::default();
                for read in content.chunks(read_size) {
                    buffer.extend_from_slice(read);
                    let progress = parser.parse(&buffer, &mut events).expect("input should be a valid http request head");
                    buffer.drain(..progress.consumed);
                }
                black_box(events.bytes);
            });
        });
    }

    group.finish();
}

/// Parses a full pipeline of requests out of one read.
fn benchmark_pipelined(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_parser_pipelined");

    for fixture in [SMALL_HEADER, LARGE_HEADER] {
        let pipeline = fixture.pipelined(PIPELINE_DEPTH);
        group.throughput(Throughput::Elements(PIPELINE_DEPTH as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.size().label()), &pipeline, |b, pipeline| {
            let mut parser = RequestParser::new();
            b.iter(|| {
                let mut events = SumEvents::default();
                let mut offset = 0;
                while offset < pipeline.len() {
                    parser.reset();
                    let progress =
                        parser.parse(&pipeline[offset..], &mut events).expect("input should be a valid http request head");
                    debug_assert_eq!(parser.state(), ParseState::Body);
                    offset += progress.consumed;
                }
                black_box(events.bytes);
            });
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_parser, benchmark_split_reads, benchmark_pipelined);
criterion_main!(decoder);
