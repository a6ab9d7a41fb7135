//! Micro-benchmark example for KISS frame wrapping/unwrapping.
//!
//! This program generates a fixed sequence of pseudo-random packets (Linear
//! Congruential Generator seeded with 0xDEADBEEF) and measures the time taken
//! to (1) wrap each packet using `wrap_data_frame` and (2) unwrap every frame
//! back with `unwrap_frame`.
//!
//! Notes:
//! - The RNG uses a fixed seed so the benchmark is reproducible.
//! - The default `PACKET_COUNT` is large to produce stable timings; set the
//!   `BENCH_PACKETS` environment variable for quick smoke-tests.
//!
//! Run with:
//!
//! ```text
//! cargo run --release --example benchmark
//! ```

use std::time::Instant;

fn main() -> kisstx::Result<()> {
    const PACKET_COUNT: usize = 1_000_000;
    // Fixed packet length, roughly an APRS position report with two hops.
    const PACKET_LEN: usize = 96;

    let packet_count = std::env::var("BENCH_PACKETS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(PACKET_COUNT);

    // Packets with arbitrary random bytes (full 0..=255, so roughly one byte
    // in 128 needs stuffing)
    let packets_random = make_packets(packet_count, PACKET_LEN, 0xDEADBEEF, |rng: &mut Lcg| {
        rng.next_u8()
    });

    // Packets with ASCII-only bytes (printable 0x20..=0x7E, never stuffed)
    let packets_ascii = make_packets(packet_count, PACKET_LEN, 0xDEADBEEF, |rng: &mut Lcg| {
        let v = rng.next_u8() % (0x7E - 0x20 + 1) as u8;
        0x20u8.wrapping_add(v)
    });

    run_bench("random bytes", &packets_random)?;
    run_bench("ASCII-only bytes", &packets_ascii)?;

    Ok(())
}

fn ns_per_item(duration: std::time::Duration, count: usize) -> f64 {
    duration.as_nanos() as f64 / count as f64
}

fn run_bench(label: &str, packets: &[Vec<u8>]) -> kisstx::Result<()> {
    let packet_count = packets.len();

    let start = Instant::now();
    let wrapped: Vec<Vec<u8>> = packets
        .iter()
        .map(|packet| kisstx::wrap_data_frame(packet))
        .collect();
    let wrap_elapsed = start.elapsed();

    let wrapped_bytes: usize = wrapped.iter().map(|frame| frame.len()).sum();

    let start = Instant::now();
    for (packet, frame) in packets.iter().zip(&wrapped) {
        let (command, payload) = kisstx::unwrap_frame(frame)?;
        assert_eq!(command, kisstx::CMD_DATA);
        assert_eq!(&payload, packet, "round-trip mismatch for {label}");
    }
    let unwrap_elapsed = start.elapsed();

    println!("--- Benchmark: {label} ---");
    println!("Packets processed: {}", packet_count);
    println!("Wrapped bytes: {}", wrapped_bytes);
    println!(
        "Wrapping took: {:?} ({:.2} ns/packet)",
        wrap_elapsed,
        ns_per_item(wrap_elapsed, packet_count)
    );
    let wrap_secs = wrap_elapsed.as_secs_f64();
    let wrap_mbps = if wrap_secs > 0.0 {
        (wrapped_bytes as f64 / 1_000_000.0) / wrap_secs
    } else {
        0.0
    };
    println!("Wrapping throughput: {:.2} MB/s", wrap_mbps);
    println!(
        "Unwrapping took: {:?} ({:.2} ns/packet)",
        unwrap_elapsed,
        ns_per_item(unwrap_elapsed, packet_count)
    );
    let unwrap_secs = unwrap_elapsed.as_secs_f64();
    let unwrap_mbps = if unwrap_secs > 0.0 {
        (wrapped_bytes as f64 / 1_000_000.0) / unwrap_secs
    } else {
        0.0
    };
    println!("Unwrapping throughput: {:.2} MB/s", unwrap_mbps);
    println!();

    Ok(())
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        // Constants from Numerical Recipes LCG.
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    fn next_u8(&mut self) -> u8 {
        (self.next() >> 24) as u8
    }
}

fn make_packets<F>(packet_count: usize, packet_len: usize, seed: u64, mut next_byte: F) -> Vec<Vec<u8>>
where
    F: FnMut(&mut Lcg) -> u8,
{
    let mut r = Lcg::new(seed);
    (0..packet_count)
        .map(|_| (0..packet_len).map(|_| next_byte(&mut r)).collect::<Vec<u8>>())
        .collect::<Vec<Vec<u8>>>()
}
