use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use icy_qoi::{qoi_decode, qoi_encode, ColorSpace};
use std::hint::black_box;

// 2x1 RGBA: RGB opcode, run of one, end marker
const SIMPLE_QOI: &[u8] = &[
    b'q', b'o', b'i', b'f', 0, 0, 0, 2, 0, 0, 0, 1, 4, 0, 0xfe, 10, 20, 30, 0xc0, 0, 0, 0, 0, 0,
    0, 0, 1,
];

fn generate_pattern(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            // Blocks of flat color with a soft gradient inside, hitting runs, cache and deltas.
            let block = ((x / 16) + (y / 16)) % 5;
            let shade = ((x % 16) + (y % 16)) as u8;
            pixels.extend_from_slice(&[
                (block * 50) as u8 + shade,
                120 - shade,
                (block * 30) as u8,
                if block == 4 { 128 } else { 255 },
            ]);
        }
    }
    pixels
}

fn bench_simple_decode(c: &mut Criterion) {
    c.bench_function("decode_simple_qoi", |b| {
        b.iter(|| {
            let result = qoi_decode(black_box(SIMPLE_QOI));
            assert!(result.is_ok());
            result
        })
    });
}

fn bench_varying_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_varying_sizes");

    for size in [32usize, 128, 512] {
        let pixels = generate_pattern(size, size);
        let encoded = qoi_encode(&pixels, size as u32, size as u32, 4, ColorSpace::Srgb)
            .expect("Failed to encode benchmark input");

        group.throughput(Throughput::Bytes(pixels.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &encoded,
            |b, data| {
                b.iter(|| {
                    let result = qoi_decode(black_box(data));
                    assert!(result.is_ok());
                    result
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_simple_decode, bench_varying_sizes);
criterion_main!(benches);
