use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use streamzip::{Streamer, StreamerOptions};

fn generate_compressible_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn generate_random_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = 0x12345678u32;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

fn write_one_deflated_entry(data: &[u8], level: u32) {
    let options = StreamerOptions::new().with_compression_level(level);
    let mut streamer = Streamer::with_options(Vec::new(), options);
    {
        let mut body = streamer.write_deflated_file("test.bin").unwrap();
        body.write(black_box(data)).unwrap();
        body.close().unwrap();
    }
    streamer.close().unwrap();
}

fn bench_compression_levels(c: &mut Criterion) {
    let sizes = [
        1024,
        10 * 1024,
        100 * 1024,
        1024 * 1024,
        10 * 1024 * 1024,
    ];

    for size in sizes {
        let mut group = c.benchmark_group(format!("write_compressible_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_compressible_data(size);

        group.bench_with_input(BenchmarkId::new("deflate_level_6", size), &data, |b, data| {
            b.iter(|| write_one_deflated_entry(data, 6));
        });

        group.bench_with_input(BenchmarkId::new("deflate_level_9", size), &data, |b, data| {
            b.iter(|| write_one_deflated_entry(data, 9));
        });

        group.finish();
    }
}

fn bench_random_data_compression(c: &mut Criterion) {
    let sizes = [100 * 1024, 1024 * 1024];

    for size in sizes {
        let mut group = c.benchmark_group(format!("write_random_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_random_data(size);

        group.bench_with_input(BenchmarkId::new("deflate_level_6", size), &data, |b, data| {
            b.iter(|| write_one_deflated_entry(data, 6));
        });

        group.finish();
    }
}

fn bench_multiple_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_multiple_entries");

    let entry_count = 100;
    let entry_size = 10 * 1024;
    group.throughput(Throughput::Bytes((entry_count * entry_size) as u64));

    let data = generate_compressible_data(entry_size);

    group.bench_function("deflate_100_entries", |b| {
        b.iter(|| {
            let mut streamer = Streamer::new(Vec::new());
            for i in 0..entry_count {
                let mut body = streamer.write_deflated_file(&format!("file_{i}.txt")).unwrap();
                body.write(black_box(&data)).unwrap();
                body.close().unwrap();
            }
            streamer.close().unwrap();
        });
    });

    group.finish();
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{}MB", bytes / (1024 * 1024))
    }
}

criterion_group!(
    benches,
    bench_compression_levels,
    bench_random_data_compression,
    bench_multiple_entries
);
criterion_main!(benches);
