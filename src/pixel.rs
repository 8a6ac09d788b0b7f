/// Pixel memory layout for decoded rows and encoder input.
///
/// These are the six storage kinds TGA can round-trip. Decoded images use
/// `Indexed8`, `Gray8`, `GrayAlpha8`, `Rgb8` or `Rgba8`; `IndexedAlpha8`
/// only occurs as encoder input (the file stores its alpha inside the
/// colormap, so decoding such a file yields `Rgba8`).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Single channel, 8-bit colormap index.
    Indexed8,
    /// Two channels, 8-bit colormap index + 8-bit alpha.
    ///
    /// Encode-only. TGA keeps at most one fully transparent palette slot,
    /// so alpha values other than opaque collapse to transparent on write.
    IndexedAlpha8,
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// Two channels, 8-bit grayscale + 8-bit alpha.
    GrayAlpha8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Indexed8 | Self::Gray8 => 1,
            Self::IndexedAlpha8 | Self::GrayAlpha8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.bytes_per_pixel()
    }

    /// Whether the layout carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::IndexedAlpha8 | Self::GrayAlpha8 | Self::Rgba8)
    }
}

/// Typed pixel that a [`crate::DecodeOutput`] can be viewed as.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy {
    /// The byte layout this pixel type corresponds to.
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGB8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGBA8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::GRAY8 {
    fn layout() -> PixelLayout {
        PixelLayout::Gray8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::GRAYA8 {
    fn layout() -> PixelLayout {
        PixelLayout::GrayAlpha8
    }
}
