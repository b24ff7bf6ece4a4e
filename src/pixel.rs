use crate::consts::{qoi_hash, QOI_CACHE_SIZE};

/// A single RGBA pixel. Channel arithmetic wraps modulo 256.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// The predictor every encode and decode session starts from.
    pub const START: Pixel = Pixel::new(0, 0, 0, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Reads a pixel from a 3 or 4 byte chunk. Missing alpha is 255.
    #[inline]
    pub(crate) fn from_chunk(chunk: &[u8]) -> Self {
        Self::new(
            chunk[0],
            chunk[1],
            chunk[2],
            chunk.get(3).copied().unwrap_or(255),
        )
    }

    /// Writes the first `out.len()` channels (3 or 4) into `out`.
    #[inline]
    pub(crate) fn write_to(self, out: &mut [u8]) {
        let rgba = [self.r, self.g, self.b, self.a];
        out.copy_from_slice(&rgba[..out.len()]);
    }

    /// Slot of this pixel in the color cache.
    #[inline]
    pub const fn hash_index(&self) -> u8 {
        qoi_hash(self.r, self.g, self.b, self.a)
    }

    /// Adds per-channel deltas to red, green and blue. Alpha is kept.
    #[inline]
    pub(crate) fn add_rgb(self, dr: u8, dg: u8, db: u8) -> Self {
        Self {
            r: self.r.wrapping_add(dr),
            g: self.g.wrapping_add(dg),
            b: self.b.wrapping_add(db),
            a: self.a,
        }
    }
}

/// The 64 slot cache of recently seen colors, indexed by [`Pixel::hash_index`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorCache {
    slots: [Pixel; QOI_CACHE_SIZE],
}

impl ColorCache {
    pub fn new() -> Self {
        Self {
            slots: [Pixel::default(); QOI_CACHE_SIZE],
        }
    }

    #[inline]
    pub fn get(&self, index: u8) -> Pixel {
        self.slots[usize::from(index) % QOI_CACHE_SIZE]
    }

    #[inline]
    pub fn insert(&mut self, pixel: Pixel) {
        self.slots[usize::from(pixel.hash_index())] = pixel;
    }

    pub fn slots(&self) -> &[Pixel; QOI_CACHE_SIZE] {
        &self.slots
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new()
    }
}
