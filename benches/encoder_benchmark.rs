use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use icy_qoi::{qoi_encode, ColorSpace, Encoder, QoiHeader};
use std::hint::black_box;

fn generate_gradient(width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            let b = 128;
            pixels.extend_from_slice(&[r, g, b, 255][..channels]);
        }
    }
    pixels
}

fn generate_noise(width: usize, height: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..width * height * 4)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn bench_encode_gradients(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_gradient");

    for size in [64usize, 256, 1024] {
        for channels in [3usize, 4] {
            let pixels = generate_gradient(size, size, channels);
            group.throughput(Throughput::Bytes(pixels.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{}ch", channels), format!("{}x{}", size, size)),
                &pixels,
                |b, pixels| {
                    b.iter(|| {
                        let result = qoi_encode(
                            black_box(pixels),
                            size as u32,
                            size as u32,
                            channels as u8,
                            ColorSpace::Srgb,
                        );
                        assert!(result.is_ok());
                        result
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_encode_noise(c: &mut Criterion) {
    let pixels = generate_noise(256, 256);

    c.bench_function("encode_noise_256x256", |b| {
        b.iter(|| {
            let result = qoi_encode(black_box(&pixels), 256, 256, 4, ColorSpace::Srgb);
            assert!(result.is_ok());
            result
        })
    });
}

fn bench_encode_small_buffers(c: &mut Criterion) {
    let pixels = generate_gradient(256, 256, 4);
    let header = QoiHeader::new(256, 256, 4, ColorSpace::Srgb).unwrap();

    c.bench_function("encode_gradient_256x256_4k_chunks", |b| {
        b.iter(|| {
            let mut encoder = Encoder::new(black_box(&pixels), header).unwrap();
            let mut chunk = [0u8; 4096];
            let mut total = 0;
            loop {
                let progress = encoder.encode_into(&mut chunk);
                total += progress.bytes_written;
                if progress.done {
                    break total;
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_encode_gradients,
    bench_encode_noise,
    bench_encode_small_buffers,
);
criterion_main!(benches);
