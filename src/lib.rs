//! # icy_qoi
//!
//! A 100% Rust library for encoding and decoding QOI ("Quite OK Image") streams.
//!
//! ## Features
//!
//! - **Encoder**: greedy opcode selection, byte-exact with the published QOI format
//! - **Decoder**: strict stream validation with classified errors
//! - **Sessions**: both directions can be driven through caller-sized buffers
//!
//! ## Quick Start
//!
//! ### Encoding pixels to QOI
//!
//! ```rust
//! use icy_qoi::{qoi_encode, ColorSpace};
//!
//! // RGBA image data (4 bytes per pixel)
//! let rgba = vec![255u8, 0, 0, 255, 0, 255, 0, 255]; // red and green pixel
//! let qoi = qoi_encode(&rgba, 2, 1, 4, ColorSpace::Srgb)?;
//! assert_eq!(&qoi[..4], b"qoif");
//! # Ok::<(), icy_qoi::QoiError>(())
//! ```
//!
//! ### Decoding QOI to pixels
//!
//! ```rust
//! use icy_qoi::{qoi_decode, qoi_encode, ColorSpace};
//!
//! let rgb = vec![10u8, 20, 30, 10, 20, 30, 11, 21, 31];
//! let qoi = qoi_encode(&rgb, 3, 1, 3, ColorSpace::Srgb)?;
//! let image = qoi_decode(&qoi)?;
//! assert_eq!(image.pixels, rgb);
//! println!("{}x{}", image.width, image.height);
//! # Ok::<(), icy_qoi::QoiError>(())
//! ```

use thiserror::Error;

pub mod consts;
pub mod decoder;
pub mod encoder;
mod header;
mod pixel;

pub use decoder::{qoi_decode, qoi_decode_reader, DecodeProgress, Decoder, QoiImage};
pub use encoder::{qoi_encode, EncodeProgress, Encoder};
pub use header::{Channels, ColorSpace, QoiHeader};
pub use pixel::{ColorCache, Pixel};

/// Errors that can occur during QOI encoding or decoding.
#[derive(Debug, Error)]
pub enum QoiError {
    /// Channel count is neither 3 (RGB) nor 4 (RGBA)
    #[error("invalid channel count: {0} (expected 3 or 4)")]
    InvalidChannelCount(u8),

    /// Colorspace tag is neither 0 (sRGB) nor 1 (linear)
    #[error("invalid colorspace: {0} (expected 0 or 1)")]
    InvalidColorSpace(u8),

    /// Width or height is zero
    #[error("empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// More pixels than the format allows
    #[error("image too large: {width}x{height}")]
    ImageTooLarge { width: u32, height: u32 },

    /// Buffer size doesn't match expected size for dimensions
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The input does not start with the `qoif` magic
    #[error("not a QOI stream (bad magic)")]
    BadMagic,

    /// The stream ends in the middle of the header or an opcode
    #[error("truncated QOI stream")]
    TruncatedStream,

    /// All pixels were decoded but the end marker does not follow
    #[error("missing end marker")]
    MissingEndMarker,

    /// The stream encodes a different number of pixels than the header declares
    #[error("pixel count mismatch: expected {expected} pixels, stream encodes {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for QOI operations.
pub type Result<T> = core::result::Result<T, QoiError>;
