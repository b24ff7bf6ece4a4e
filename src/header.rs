use crate::consts::{QOI_HEADER_SIZE, QOI_MAGIC, QOI_PIXELS_MAX};
use crate::{QoiError, Result};

/// Number of channels stored per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    #[inline]
    pub const fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Channels {
    type Error = QoiError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(QoiError::InvalidChannelCount(other)),
        }
    }
}

/// Colorspace tag of the header. Informational only, it never changes how pixels decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorSpace {
    /// sRGB with linear alpha
    #[default]
    Srgb = 0,
    /// All channels linear
    Linear = 1,
}

impl TryFrom<u8> for ColorSpace {
    type Error = QoiError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ColorSpace::Srgb),
            1 => Ok(ColorSpace::Linear),
            other => Err(QoiError::InvalidColorSpace(other)),
        }
    }
}

/// The 14 byte header in front of every QOI stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QoiHeader {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub colorspace: ColorSpace,
}

impl QoiHeader {
    /// Builds a validated header.
    ///
    /// # Errors
    ///
    /// Returns [`QoiError::InvalidChannelCount`] if `channels` is not 3 or 4,
    /// [`QoiError::EmptyImage`] if either dimension is zero and
    /// [`QoiError::ImageTooLarge`] past [`QOI_PIXELS_MAX`] pixels.
    pub fn new(width: u32, height: u32, channels: u8, colorspace: ColorSpace) -> Result<Self> {
        let header = Self {
            width,
            height,
            channels: Channels::try_from(channels)?,
            colorspace,
        };
        header.validate()?;
        Ok(header)
    }

    /// Parses the header at the start of `data`.
    ///
    /// The magic is checked first so that input of another format always reports
    /// [`QoiError::BadMagic`], even when it is shorter than a header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let magic_len = data.len().min(QOI_MAGIC.len());
        if data[..magic_len] != QOI_MAGIC[..magic_len] {
            return Err(QoiError::BadMagic);
        }
        let Some(bytes) = data.get(..QOI_HEADER_SIZE) else {
            return Err(QoiError::TruncatedStream);
        };

        let header = Self {
            width: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            height: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            channels: Channels::try_from(bytes[12])?,
            colorspace: ColorSpace::try_from(bytes[13])?,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; QOI_HEADER_SIZE] {
        let mut bytes = [0u8; QOI_HEADER_SIZE];
        bytes[..4].copy_from_slice(&QOI_MAGIC);
        bytes[4..8].copy_from_slice(&self.width.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.height.to_be_bytes());
        bytes[12] = self.channels as u8;
        bytes[13] = self.colorspace as u8;
        bytes
    }

    /// Checks the dimensions and returns the pixel count.
    pub fn validate(&self) -> Result<usize> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(QoiError::EmptyImage { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .filter(|&count| count <= QOI_PIXELS_MAX)
            .ok_or(QoiError::ImageTooLarge { width, height })
    }

    /// `width * height`. Only meaningful on a validated header.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the raw pixel buffer in bytes.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.pixel_count() * self.channels.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bytes() {
        let header = QoiHeader::new(2, 1, 4, ColorSpace::Srgb).unwrap();
        assert_eq!(
            header.to_bytes(),
            [0x71, 0x6f, 0x69, 0x66, 0, 0, 0, 2, 0, 0, 0, 1, 4, 0]
        );
        assert_eq!(QoiHeader::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_header_big_endian() {
        let header = QoiHeader::new(0x0102, 0x0304, 3, ColorSpace::Linear).unwrap();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[4..14], &[0, 0, 1, 2, 0, 0, 3, 4, 3, 1]);
    }

    #[test]
    fn test_invalid_channels() {
        assert!(matches!(
            QoiHeader::new(1, 1, 2, ColorSpace::Srgb),
            Err(QoiError::InvalidChannelCount(2))
        ));
        let mut bytes = QoiHeader::new(1, 1, 3, ColorSpace::Srgb).unwrap().to_bytes();
        bytes[12] = 5;
        assert!(matches!(
            QoiHeader::parse(&bytes),
            Err(QoiError::InvalidChannelCount(5))
        ));
    }

    #[test]
    fn test_invalid_colorspace() {
        let mut bytes = QoiHeader::new(1, 1, 3, ColorSpace::Srgb).unwrap().to_bytes();
        bytes[13] = 2;
        assert!(matches!(
            QoiHeader::parse(&bytes),
            Err(QoiError::InvalidColorSpace(2))
        ));
    }

    #[test]
    fn test_empty_and_oversized() {
        assert!(matches!(
            QoiHeader::new(0, 10, 4, ColorSpace::Srgb),
            Err(QoiError::EmptyImage { width: 0, height: 10 })
        ));
        assert!(matches!(
            QoiHeader::new(10, 0, 4, ColorSpace::Srgb),
            Err(QoiError::EmptyImage { .. })
        ));
        assert!(matches!(
            QoiHeader::new(u32::MAX, u32::MAX, 4, ColorSpace::Srgb),
            Err(QoiError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_short_input() {
        assert!(matches!(QoiHeader::parse(b""), Err(QoiError::TruncatedStream)));
        assert!(matches!(QoiHeader::parse(b"qo"), Err(QoiError::TruncatedStream)));
        assert!(matches!(QoiHeader::parse(b"qoif\0\0"), Err(QoiError::TruncatedStream)));
        assert!(matches!(QoiHeader::parse(b"PNG"), Err(QoiError::BadMagic)));
        assert!(matches!(
            QoiHeader::parse(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Err(QoiError::BadMagic)
        ));
    }
}
