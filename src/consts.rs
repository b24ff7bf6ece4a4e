//! Constants of the QOI wire format.
//!
//! A stream is a 14 byte header, a sequence of opcodes and an 8 byte end marker.
//!
//! ```text
//! header:  "qoif" | width: u32 BE | height: u32 BE | channels: u8 | colorspace: u8
//! opcodes: 0xFE r g b          RGB
//!          0xFF r g b a        RGBA
//!          00iiiiii            INDEX  cache slot i
//!          01rrggbb            DIFF   each delta biased by 2
//!          10gggggg rrrrbbbb   LUMA   dg biased by 32, dr-dg / db-dg biased by 8
//!          11llllll            RUN    length l + 1 (1..=62)
//! end:     00 00 00 00 00 00 00 01
//! ```

pub const QOI_MAGIC: [u8; 4] = *b"qoif";
pub const QOI_HEADER_SIZE: usize = 14;
pub const QOI_END_MARKER: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01];

pub const QOI_OP_INDEX: u8 = 0x00;
pub const QOI_OP_DIFF: u8 = 0x40;
pub const QOI_OP_LUMA: u8 = 0x80;
pub const QOI_OP_RUN: u8 = 0xc0;
pub const QOI_OP_RGB: u8 = 0xfe;
pub const QOI_OP_RGBA: u8 = 0xff;

/// Selects the 2-bit tag of the short opcodes.
pub const QOI_MASK_2: u8 = 0xc0;
/// Selects the 6-bit payload of the short opcodes.
pub const QOI_PAYLOAD_MASK: u8 = 0x3f;

pub const QOI_CACHE_SIZE: usize = 64;

/// Longest run a single RUN opcode carries. 63 and 64 would collide with the RGB and RGBA tags.
pub const QOI_MAX_RUN: u8 = 62;

/// Upper bound on `width * height` accepted by the encoder and decoder.
pub const QOI_PIXELS_MAX: usize = 400_000_000;

/// Hash of a pixel into the color cache.
#[inline]
pub const fn qoi_hash(r: u8, g: u8, b: u8, a: u8) -> u8 {
    let sum = r as u32 * 3 + g as u32 * 5 + b as u32 * 7 + a as u32 * 11;
    (sum % QOI_CACHE_SIZE as u32) as u8
}

/// Upper bound of the encoded size of an image, header and end marker included.
///
/// The worst case is one RGBA opcode (or RGB for 3 channels) per pixel.
pub const fn qoi_max_encoded_len(pixel_count: usize, channels: usize) -> usize {
    QOI_HEADER_SIZE + pixel_count * (channels + 1) + QOI_END_MARKER.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_of_start_pixel() {
        assert_eq!(qoi_hash(0, 0, 0, 255), 53);
        assert_eq!(qoi_hash(0, 0, 0, 0), 0);
    }

    #[test]
    fn test_hash_wraps_into_cache() {
        assert_eq!(qoi_hash(255, 255, 255, 255), 38);
        assert_eq!(qoi_hash(10, 20, 30, 255), 9);
        assert!((qoi_hash(200, 100, 50, 7) as usize) < QOI_CACHE_SIZE);
    }

    #[test]
    fn test_run_tag_never_collides() {
        assert!(QOI_OP_RUN | (QOI_MAX_RUN - 1) < QOI_OP_RGB);
    }
}
