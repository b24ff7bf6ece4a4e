#![no_main]

use libfuzzer_sys::fuzz_target;
use icy_qoi::{qoi_decode, qoi_encode, ColorSpace};
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    rgba: bool,
    pixels: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let width = (input.width as usize).max(1).min(64);
    let height = (input.height as usize).max(1).min(64);
    let channels = if input.rgba { 4 } else { 3 };

    let expected_size = width * height * channels;
    if input.pixels.len() < expected_size {
        return;
    }

    let pixels = &input.pixels[..expected_size];
    let encoded = qoi_encode(pixels, width as u32, height as u32, channels as u8, ColorSpace::Srgb)
        .expect("valid input must encode");
    let decoded = qoi_decode(&encoded).expect("encoded stream must decode");

    // Lossless: every byte must come back
    assert_eq!(decoded.pixels, pixels);
});
