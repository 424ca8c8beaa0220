//! Benchmarks for Ogg muxing and demuxing.
//!
//! Run with: cargo bench -p giztoy-ogg

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use giztoy_ogg::{crc, Demuxer, Muxer};

fn mux_stream(packet_size: usize, count: usize) -> Vec<u8> {
    let packet = vec![0x5au8; packet_size];
    let mut muxer = Muxer::new(1);
    let mut out = Vec::new();
    for i in 0..count {
        for page in muxer.write_packet(&packet, (i as i64 + 1) * 960).unwrap() {
            out.extend_from_slice(&page.to_bytes());
        }
    }
    out.extend_from_slice(&muxer.close(count as i64 * 960).unwrap().to_bytes());
    out
}

/// Benchmark: checksum over one maximum-size body.
fn bench_checksum(c: &mut Criterion) {
    let data = vec![0xa5u8; 65025];
    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("65025 bytes", |b| b.iter(|| crc::checksum(&data)));
    group.finish();
}

/// Benchmark: muxing 100 packets of various sizes.
fn bench_mux(c: &mut Criterion) {
    let mut group = c.benchmark_group("mux");

    for size in [64, 1024, 100_000].iter() {
        group.throughput(Throughput::Bytes((*size * 100) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| mux_stream(size, 100));
        });
    }

    group.finish();
}

/// Benchmark: demuxing with different input chunk sizes.
fn bench_demux(c: &mut Criterion) {
    let stream = mux_stream(1024, 100);
    let mut group = c.benchmark_group("demux");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk in [1, 4096, stream.len()].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), chunk, |b, &chunk| {
            b.iter(|| {
                let mut demuxer = Demuxer::new();
                let mut count = 0;
                for piece in stream.chunks(chunk) {
                    let mut input = piece;
                    while !input.is_empty() {
                        let used = demuxer.feed(input).unwrap();
                        input = &input[used..];
                        while let Some(packet) = demuxer.next_packet() {
                            if !packet.continues {
                                count += 1;
                            }
                        }
                    }
                }
                count
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_checksum, bench_mux, bench_demux);
criterion_main!(benches);
