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

fn archive_size_for(data: &[u8], level: u32) -> u64 {
    let options = StreamerOptions::new().with_compression_level(level);
    let mut streamer = Streamer::with_options(Vec::new(), options);
    {
        let mut body = streamer.write_deflated_file("test.bin").unwrap();
        body.write(data).unwrap();
        body.close().unwrap();
    }
    streamer.close().unwrap().len() as u64
}

fn report(name: &str, data: &[u8], method_name: &str, level: u32) {
    let original_size = data.len() as u64;
    let archive_size = archive_size_for(data, level);
    let ratio = (archive_size as f64 / original_size as f64) * 100.0;

    println!(
        "{:<20} | {:<15} | {:>12} | {:>12} | {:>8.2}%",
        name,
        method_name,
        format_bytes(original_size),
        format_bytes(archive_size),
        ratio
    );
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn main() {
    println!("\n╔════════════════════════════════════════════════════════════════════════════╗");
    println!("║                    streamzip Archive Size Analysis                           ║");
    println!("╚════════════════════════════════════════════════════════════════════════════╝\n");

    println!(
        "{:<20} | {:<15} | {:>12} | {:>12} | {:>8}",
        "Data Type", "Method", "Original", "Archive", "Ratio"
    );
    println!("{:-<20}-+-{:-<15}-+-{:->12}-+-{:->12}-+-{:->8}", "", "", "", "", "");

    let compressible_1mb = generate_compressible_data(1024 * 1024);
    report("Compressible 1MB", &compressible_1mb, "DEFLATE lvl 1", 1);
    report("Compressible 1MB", &compressible_1mb, "DEFLATE lvl 6", 6);
    report("Compressible 1MB", &compressible_1mb, "DEFLATE lvl 9", 9);

    println!();

    let random_1mb = generate_random_data(1024 * 1024);
    report("Random 1MB", &random_1mb, "DEFLATE lvl 6", 6);
    report("Random 1MB", &random_1mb, "DEFLATE lvl 9", 9);

    println!();

    let compressible_10mb = generate_compressible_data(10 * 1024 * 1024);
    report("Compressible 10MB", &compressible_10mb, "DEFLATE lvl 6", 6);
    report("Compressible 10MB", &compressible_10mb, "DEFLATE lvl 9", 9);

    println!();
}
