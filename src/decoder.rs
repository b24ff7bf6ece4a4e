//! QOI decoder.
//!
//! Opcodes are resolved strictly in stream order against a running predictor
//! pixel and the 64 slot color cache. Every malformed stream is reported as one
//! of the classified [`QoiError`] variants; no pixel is ever made up.

use std::io::{self, Read};

use log::{debug, trace};

use crate::consts::{
    QOI_END_MARKER, QOI_HEADER_SIZE, QOI_MASK_2, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA,
    QOI_OP_RGB, QOI_OP_RGBA, QOI_PAYLOAD_MASK,
};
use crate::{Channels, ColorCache, ColorSpace, Pixel, QoiError, QoiHeader, Result};

/// Input block size used by [`qoi_decode_reader`].
const MAX_BLOCK: usize = 65536;

/// A decoded QOI image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QoiImage {
    /// Pixel data in row-major order, `channels` bytes per pixel
    pub pixels: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Channels per pixel as declared by the header
    pub channels: Channels,
    /// Colorspace tag from the header
    pub colorspace: ColorSpace,
}

/// Outcome of one [`Decoder::decode_from`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeProgress {
    /// Bytes consumed from the front of the input.
    pub consumed: usize,
    /// Pixels produced by this call.
    pub pixels_written: usize,
    /// True once the end marker has been consumed.
    pub done: bool,
}

/// A resumable decoding session for the opcodes following a header.
///
/// Input may be split at arbitrary byte positions. A call stops in front of an
/// opcode that is not complete yet and reports how much it consumed; the caller
/// passes the unconsumed tail again together with the next bytes.
#[derive(Debug)]
pub struct Decoder {
    header: QoiHeader,
    pixels: Vec<u8>,
    /// Pixels produced so far, also the scan position.
    position: usize,
    total: usize,
    current: Pixel,
    cache: ColorCache,
    done: bool,
}

impl Decoder {
    /// Starts a session for an image described by `header`.
    ///
    /// # Errors
    ///
    /// Fails if the header has zero or too large dimensions.
    pub fn new(header: QoiHeader) -> Result<Self> {
        let total = header.validate()?;
        Ok(Self {
            header,
            pixels: vec![0; total * header.channels.count()],
            position: 0,
            total,
            current: Pixel::START,
            cache: ColorCache::new(),
            done: false,
        })
    }

    pub fn header(&self) -> &QoiHeader {
        &self.header
    }

    /// The color cache as it stands after the opcodes decoded so far.
    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    pub fn pixels_decoded(&self) -> usize {
        self.position
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decodes as many complete opcodes from `input` as possible.
    ///
    /// # Errors
    ///
    /// - [`QoiError::PixelCountMismatch`] if the end marker shows up early or a run
    ///   overshoots the image
    /// - [`QoiError::MissingEndMarker`] if anything but the end marker follows the last pixel
    pub fn decode_from(&mut self, input: &[u8]) -> Result<DecodeProgress> {
        let start = self.position;
        let mut cursor = 0;

        while !self.done {
            let rest = &input[cursor..];
            let Some(&tag) = rest.first() else {
                break;
            };

            // A short tail that could still become the end marker waits for more input.
            if rest.len() < QOI_END_MARKER.len() && QOI_END_MARKER.starts_with(rest) {
                break;
            }
            if rest.starts_with(&QOI_END_MARKER) {
                if self.position != self.total {
                    return Err(QoiError::PixelCountMismatch {
                        expected: self.total,
                        actual: self.position,
                    });
                }
                cursor += QOI_END_MARKER.len();
                self.done = true;
                trace!("decoder session finished");
                break;
            }
            if self.position == self.total {
                return Err(QoiError::MissingEndMarker);
            }

            let op_len = match tag {
                QOI_OP_RGBA => 5,
                QOI_OP_RGB => 4,
                _ if tag & QOI_MASK_2 == QOI_OP_LUMA => 2,
                _ => 1,
            };
            if rest.len() < op_len {
                break;
            }

            self.current = match tag {
                QOI_OP_RGBA => Pixel::new(rest[1], rest[2], rest[3], rest[4]),
                QOI_OP_RGB => Pixel::new(rest[1], rest[2], rest[3], self.current.a),
                _ => match tag & QOI_MASK_2 {
                    QOI_OP_INDEX => self.cache.get(tag & QOI_PAYLOAD_MASK),
                    QOI_OP_DIFF => self.current.add_rgb(
                        ((tag >> 4) & 0x03).wrapping_sub(2),
                        ((tag >> 2) & 0x03).wrapping_sub(2),
                        (tag & 0x03).wrapping_sub(2),
                    ),
                    QOI_OP_LUMA => {
                        let dg = (tag & QOI_PAYLOAD_MASK).wrapping_sub(32);
                        let dr = (rest[1] >> 4).wrapping_sub(8).wrapping_add(dg);
                        let db = (rest[1] & 0x0f).wrapping_sub(8).wrapping_add(dg);
                        self.current.add_rgb(dr, dg, db)
                    }
                    _ => {
                        let run = usize::from(tag & QOI_PAYLOAD_MASK) + 1;
                        if self.position + run > self.total {
                            return Err(QoiError::PixelCountMismatch {
                                expected: self.total,
                                actual: self.position + run,
                            });
                        }
                        for _ in 0..run {
                            self.emit();
                        }
                        cursor += op_len;
                        continue;
                    }
                },
            };
            self.emit();
            cursor += op_len;
        }

        Ok(DecodeProgress {
            consumed: cursor,
            pixels_written: self.position - start,
            done: self.done,
        })
    }

    /// Ends the session and hands out the image.
    ///
    /// # Errors
    ///
    /// - [`QoiError::MissingEndMarker`] if every pixel was decoded but no end marker was seen
    /// - [`QoiError::TruncatedStream`] if the input stopped before the last pixel
    pub fn finish(self) -> Result<QoiImage> {
        if !self.done {
            return Err(if self.position == self.total {
                QoiError::MissingEndMarker
            } else {
                QoiError::TruncatedStream
            });
        }

        Ok(QoiImage {
            pixels: self.pixels,
            width: self.header.width,
            height: self.header.height,
            channels: self.header.channels,
            colorspace: self.header.colorspace,
        })
    }

    /// Writes the current pixel at the scan position and records it in the cache.
    #[inline]
    fn emit(&mut self) {
        let channels = self.header.channels.count();
        let offset = self.position * channels;
        self.current
            .write_to(&mut self.pixels[offset..offset + channels]);
        self.cache.insert(self.current);
        self.position += 1;
    }
}

/// Decodes a complete QOI stream.
///
/// # Returns
///
/// The pixel data in row-major order with as many channels per pixel as the header
/// declares. Three channel streams decode to RGB, their alpha is implicitly 255.
///
/// # Example
///
/// ```rust
/// use icy_qoi::qoi_decode;
///
/// let stream = [
///     b'q', b'o', b'i', b'f', 0, 0, 0, 2, 0, 0, 0, 1, 4, 0, // 2x1 RGBA
///     0xfe, 10, 20, 30, // RGB
///     0xc0,             // RUN of 1
///     0, 0, 0, 0, 0, 0, 0, 1,
/// ];
/// let image = qoi_decode(&stream)?;
/// assert_eq!(image.pixels, [10, 20, 30, 255, 10, 20, 30, 255]);
/// # Ok::<(), icy_qoi::QoiError>(())
/// ```
///
/// # Errors
///
/// - [`QoiError::BadMagic`] if the data does not start with `qoif`
/// - [`QoiError::TruncatedStream`] if the header or an opcode is cut short
/// - [`QoiError::MissingEndMarker`] if the end marker does not follow the last pixel
/// - [`QoiError::PixelCountMismatch`] if the opcodes cover more or fewer pixels than declared
#[must_use = "this returns the decoded QoiImage"]
pub fn qoi_decode(data: &[u8]) -> Result<QoiImage> {
    let header = QoiHeader::parse(data)?;
    let mut decoder = Decoder::new(header)?;

    let body = &data[QOI_HEADER_SIZE..];
    let progress = decoder.decode_from(body)?;
    if progress.done && progress.consumed < body.len() {
        debug!(
            "ignoring {} bytes after the end marker",
            body.len() - progress.consumed
        );
    }

    let image = decoder.finish()?;
    debug!(
        "decoded {}x{} image ({} channels) from {} bytes",
        image.width,
        image.height,
        image.channels.count(),
        data.len()
    );
    Ok(image)
}

/// Decodes a QOI stream from a reader, block by block.
///
/// Reading stops at the end marker; the reader is not drained beyond the block that
/// contained it.
pub fn qoi_decode_reader<R: Read>(mut reader: R) -> Result<QoiImage> {
    let mut head = Vec::with_capacity(QOI_HEADER_SIZE);
    reader
        .by_ref()
        .take(QOI_HEADER_SIZE as u64)
        .read_to_end(&mut head)?;
    let mut decoder = Decoder::new(QoiHeader::parse(&head)?)?;

    let mut buffer = vec![0u8; MAX_BLOCK];
    let mut filled = 0;
    loop {
        let read = match reader.read(&mut buffer[filled..]) {
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        filled += read;

        let progress = decoder.decode_from(&buffer[..filled])?;
        buffer.copy_within(progress.consumed..filled, 0);
        filled -= progress.consumed;

        if progress.done || read == 0 {
            break;
        }
    }

    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(width: u32, height: u32, channels: u8, ops: &[u8]) -> Vec<u8> {
        let header = QoiHeader::new(width, height, channels, ColorSpace::Srgb).unwrap();
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(ops);
        data.extend_from_slice(&QOI_END_MARKER);
        data
    }

    #[test]
    fn test_decode_index_reads_cache() {
        // RGBA, DIFF to a new color, INDEX back to the first one.
        let data = stream(3, 1, 4, &[0xff, 1, 2, 3, 4, 0x7f, 14]);
        let image = qoi_decode(&data).unwrap();
        assert_eq!(image.pixels, [1, 2, 3, 4, 2, 3, 4, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_rgb_keeps_alpha() {
        let data = stream(2, 1, 4, &[0xff, 1, 2, 3, 4, 0xfe, 9, 8, 7]);
        let image = qoi_decode(&data).unwrap();
        assert_eq!(image.pixels, [1, 2, 3, 4, 9, 8, 7, 4]);
    }

    #[test]
    fn test_decode_luma_wraps() {
        // dg = -32, dr - dg = -8, db - dg = 7
        let data = stream(1, 1, 3, &[0x80, 0x0f]);
        let image = qoi_decode(&data).unwrap();
        assert_eq!(image.pixels, [216, 224, 231]);
    }

    #[test]
    fn test_run_updates_cache() {
        let data = stream(2, 1, 4, &[0xc1]);
        let mut decoder = Decoder::new(QoiHeader::parse(&data).unwrap()).unwrap();
        decoder.decode_from(&data[QOI_HEADER_SIZE..]).unwrap();
        assert_eq!(decoder.cache().get(53), Pixel::START);
    }

    #[test]
    fn test_stalls_on_partial_opcode() {
        let data = stream(1, 1, 4, &[0xff, 1, 2, 3, 4]);
        let body = &data[QOI_HEADER_SIZE..];
        let mut decoder = Decoder::new(QoiHeader::parse(&data).unwrap()).unwrap();

        let progress = decoder.decode_from(&body[..3]).unwrap();
        assert_eq!(progress.consumed, 0);
        assert_eq!(progress.pixels_written, 0);

        let progress = decoder.decode_from(body).unwrap();
        assert_eq!(progress.consumed, body.len());
        assert_eq!(progress.pixels_written, 1);
        assert!(progress.done);
    }

    #[test]
    fn test_opcode_after_last_pixel() {
        let data = stream(1, 1, 3, &[0xc0, 0xc0]);
        assert!(matches!(qoi_decode(&data), Err(QoiError::MissingEndMarker)));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut data = stream(1, 1, 3, &[0xc0]);
        data.extend_from_slice(b"garbage");
        assert_eq!(qoi_decode(&data).unwrap().pixels, [0, 0, 0]);
    }
}
