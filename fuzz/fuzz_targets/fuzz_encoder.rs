#![no_main]

use libfuzzer_sys::fuzz_target;
use icy_qoi::{ColorSpace, Encoder, QoiHeader};
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    channels: u8,
    chunk_size: u8,
    pixels: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let header = match QoiHeader::new(
        input.width as u32,
        input.height as u32,
        input.channels,
        ColorSpace::Srgb,
    ) {
        Ok(header) => header,
        Err(_) => return,
    };

    let expected_size = header.buffer_len();
    if input.pixels.len() < expected_size {
        return;
    }

    // The encoder should never panic, whatever the output buffer size
    let mut encoder = Encoder::new(&input.pixels[..expected_size], header).unwrap();
    let mut chunk = vec![0u8; (input.chunk_size as usize).max(1)];
    let mut total = 0;
    loop {
        let progress = encoder.encode_into(&mut chunk);
        total += progress.bytes_written;
        if progress.done {
            break;
        }
    }
    assert!(total <= encoder.max_encoded_len());
});
