//! QOI encoder.
//!
//! Every pixel is compared against the previous one and written with the smallest
//! opcode that reproduces it. The candidates overlap, so they are tried in a fixed
//! order: RUN, INDEX, DIFF, LUMA, RGB and finally RGBA.

use std::io::Write;

use log::{debug, trace};

use crate::consts::{
    qoi_max_encoded_len, QOI_END_MARKER, QOI_MAX_RUN, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA,
    QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN,
};
use crate::{ColorCache, ColorSpace, Pixel, QoiError, QoiHeader, Result};

/// Output block size used by [`Encoder::encode_to`].
const MAX_BLOCK: usize = 65536;

/// Outcome of one [`Encoder::encode_into`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeProgress {
    /// Bytes written to the front of the output buffer.
    pub bytes_written: usize,
    /// True once the end marker has been fully written.
    pub done: bool,
}

/// A resumable encoding session over one image.
///
/// The session owns all mutable state of the encoding (predictor, cache, pending run
/// and scan position), so output can be produced into buffers of any size.
///
/// ```rust
/// use icy_qoi::{ColorSpace, Encoder, QoiHeader};
///
/// let pixels = [0u8, 0, 0, 255, 0, 0, 0, 255];
/// let header = QoiHeader::new(2, 1, 4, ColorSpace::Srgb)?;
/// let mut encoder = Encoder::new(&pixels, header)?;
///
/// let mut stream = Vec::new();
/// let mut chunk = [0u8; 5];
/// loop {
///     let progress = encoder.encode_into(&mut chunk);
///     stream.extend_from_slice(&chunk[..progress.bytes_written]);
///     if progress.done {
///         break;
///     }
/// }
/// assert_eq!(stream.len(), 14 + 1 + 8);
/// # Ok::<(), icy_qoi::QoiError>(())
/// ```
pub struct Encoder<'a> {
    header: QoiHeader,
    pixels: std::slice::ChunksExact<'a, u8>,
    state: EncodeState,
    outbox: Outbox,
    stage: Stage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Header,
    Pixels,
    Done,
}

struct EncodeState {
    /// The last pixel written by an opcode other than RUN.
    previous: Pixel,
    cache: ColorCache,
    /// Pixels equal to `previous` not yet written out.
    run: u8,
}

/// Bytes produced but not yet handed to the caller.
///
/// Large enough for the header, the end marker, or a flushed run followed by RGBA.
struct Outbox {
    bytes: [u8; 16],
    start: usize,
    end: usize,
}

impl<'a> Encoder<'a> {
    /// Starts a session for `pixels`, laid out as described by `header`.
    ///
    /// # Errors
    ///
    /// Fails if the header is invalid or `pixels` is not exactly
    /// `width * height * channels` bytes long. Nothing is produced in that case.
    pub fn new(pixels: &'a [u8], header: QoiHeader) -> Result<Self> {
        header.validate()?;
        let expected = header.buffer_len();
        if pixels.len() != expected {
            return Err(QoiError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            header,
            pixels: pixels.chunks_exact(header.channels.count()),
            state: EncodeState::new(),
            outbox: Outbox::new(),
            stage: Stage::Header,
        })
    }

    pub fn header(&self) -> &QoiHeader {
        &self.header
    }

    /// The color cache as it stands after the pixels encoded so far.
    pub fn cache(&self) -> &ColorCache {
        &self.state.cache
    }

    /// Number of pixels consumed from the input so far.
    pub fn pixels_encoded(&self) -> usize {
        self.header.pixel_count() - self.pixels.len()
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done && self.outbox.is_empty()
    }

    /// Upper bound of the complete encoded stream for this image.
    pub fn max_encoded_len(&self) -> usize {
        qoi_max_encoded_len(self.header.pixel_count(), self.header.channels.count())
    }

    /// Encodes into `out` until it is full or the stream is complete.
    ///
    /// Call again with fresh space until `done` is reported. Calls after that
    /// write nothing.
    pub fn encode_into(&mut self, out: &mut [u8]) -> EncodeProgress {
        let capacity = out.len();
        let mut out = out;

        loop {
            self.outbox.drain_into(&mut out);
            if !self.outbox.is_empty() {
                break;
            }

            match self.stage {
                Stage::Done => break,
                _ if out.is_empty() => break,
                Stage::Header => {
                    self.outbox.extend(&self.header.to_bytes());
                    self.stage = Stage::Pixels;
                }
                Stage::Pixels => match self.pixels.next() {
                    Some(chunk) => self.state.push(Pixel::from_chunk(chunk), &mut self.outbox),
                    None => {
                        self.state.flush_run(&mut self.outbox);
                        self.outbox.extend(&QOI_END_MARKER);
                        self.stage = Stage::Done;
                        trace!("encoder session finished");
                    }
                },
            }
        }

        EncodeProgress {
            bytes_written: capacity - out.len(),
            done: self.is_done(),
        }
    }

    /// Writes the remaining stream into `writer`, returning the number of bytes written.
    pub fn encode_to<W: Write>(&mut self, mut writer: W) -> Result<usize> {
        let block = MAX_BLOCK.max(self.header.width as usize * 4);
        let mut buffer = vec![0u8; block];
        let mut total = 0;

        loop {
            let progress = self.encode_into(&mut buffer);
            writer.write_all(&buffer[..progress.bytes_written])?;
            total += progress.bytes_written;
            if progress.done {
                break;
            }
        }
        writer.flush()?;

        Ok(total)
    }
}

impl EncodeState {
    fn new() -> Self {
        Self {
            previous: Pixel::START,
            cache: ColorCache::new(),
            run: 0,
        }
    }

    fn push(&mut self, px: Pixel, out: &mut Outbox) {
        if px == self.previous {
            self.run += 1;
            if self.run == QOI_MAX_RUN {
                self.flush_run(out);
            }
            return;
        }

        self.flush_run(out);

        let index = px.hash_index();
        let prev = self.previous;
        if self.cache.get(index) == px {
            out.push(QOI_OP_INDEX | index);
        } else if px.a == prev.a {
            let dr = px.r.wrapping_sub(prev.r);
            let dg = px.g.wrapping_sub(prev.g);
            let db = px.b.wrapping_sub(prev.b);

            // Biased deltas; a wrapped negative delta lands far above the range.
            let (diff_r, diff_g, diff_b) = (dr.wrapping_add(2), dg.wrapping_add(2), db.wrapping_add(2));
            let luma_g = dg.wrapping_add(32);
            let luma_r = dr.wrapping_sub(dg).wrapping_add(8);
            let luma_b = db.wrapping_sub(dg).wrapping_add(8);

            if diff_r < 4 && diff_g < 4 && diff_b < 4 {
                out.push(QOI_OP_DIFF | diff_r << 4 | diff_g << 2 | diff_b);
            } else if luma_g < 64 && luma_r < 16 && luma_b < 16 {
                out.extend(&[QOI_OP_LUMA | luma_g, luma_r << 4 | luma_b]);
            } else {
                out.extend(&[QOI_OP_RGB, px.r, px.g, px.b]);
            }
        } else {
            out.extend(&[QOI_OP_RGBA, px.r, px.g, px.b, px.a]);
        }

        self.cache.insert(px);
        self.previous = px;
    }

    fn flush_run(&mut self, out: &mut Outbox) {
        if self.run > 0 {
            out.push(QOI_OP_RUN | (self.run - 1));
            self.run = 0;
        }
    }
}

impl Outbox {
    fn new() -> Self {
        Self {
            bytes: [0; 16],
            start: 0,
            end: 0,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.bytes[self.end] = byte;
        self.end += 1;
    }

    #[inline]
    fn extend(&mut self, bytes: &[u8]) {
        self.bytes[self.end..self.end + bytes.len()].copy_from_slice(bytes);
        self.end += bytes.len();
    }

    /// Moves as many pending bytes as fit to the front of `out` and advances `out` past them.
    fn drain_into(&mut self, out: &mut &mut [u8]) {
        let count = (self.end - self.start).min(out.len());
        let (head, tail) = core::mem::take(out).split_at_mut(count);
        head.copy_from_slice(&self.bytes[self.start..self.start + count]);
        *out = tail;

        self.start += count;
        if self.is_empty() {
            self.start = 0;
            self.end = 0;
        }
    }
}

/// Encode raw pixel data into a complete QOI stream.
///
/// # Arguments
/// * `pixels` - Raw pixel data, `channels` bytes per pixel in row-major order
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 3 for RGB, 4 for RGBA
/// * `colorspace` - Colorspace tag stored in the header
///
/// # Example
/// ```rust
/// use icy_qoi::{qoi_encode, ColorSpace};
///
/// let rgba = [10u8, 20, 30, 255, 10, 20, 30, 255];
/// let qoi = qoi_encode(&rgba, 2, 1, 4, ColorSpace::Srgb)?;
/// assert_eq!(&qoi[14..19], &[0xfe, 10, 20, 30, 0xc0]);
/// # Ok::<(), icy_qoi::QoiError>(())
/// ```
#[must_use = "this returns the encoded QOI stream"]
pub fn qoi_encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    colorspace: ColorSpace,
) -> Result<Vec<u8>> {
    let header = QoiHeader::new(width, height, channels, colorspace)?;
    let mut encoder = Encoder::new(pixels, header)?;

    let mut out = vec![0u8; encoder.max_encoded_len()];
    let mut written = 0;
    loop {
        let progress = encoder.encode_into(&mut out[written..]);
        written += progress.bytes_written;
        if progress.done {
            break;
        }
        out.resize(out.len() + MAX_BLOCK, 0);
    }
    out.truncate(written);

    debug!(
        "encoded {}x{} image ({} channels) into {} bytes",
        width, height, channels, written
    );
    Ok(out)
}
