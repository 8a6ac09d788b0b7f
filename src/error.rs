use alloc::string::String;
use enough::StopReason;

/// Errors from TGA decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TgaError {
    #[error("file too short for the 18-byte TGA header")]
    TruncatedHeader,

    #[error("pixel data ends before the image is complete")]
    TruncatedPixelData,

    #[error("RLE stream ends inside a packet")]
    UnexpectedEndOfStream,

    #[error("unknown image type code {0}")]
    UnsupportedImageType(u8),

    #[error(
        "unhandled sub-format (type = {image_type}, bpp = {bits_per_pixel}, alpha = {alpha_bits})"
    )]
    UnsupportedSubformat {
        image_type: u8,
        bits_per_pixel: u8,
        alpha_bits: u8,
    },

    #[error("color map type {0} does not match the image type")]
    InvalidColorMapType(u8),

    #[error("unsupported colormap depth: {0}")]
    UnsupportedColorMapDepth(u8),

    #[error("colormap index {index} outside the {length}-entry table")]
    IndexOutOfRange { index: u16, length: u16 },

    #[error("TGA format does not support multiple layers")]
    MultipleLayersUnsupported,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: crate::PixelLayout,
        actual: crate::PixelLayout,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for TgaError {
    fn from(r: StopReason) -> Self {
        TgaError::Cancelled(r)
    }
}
