//! Pixel-format resolution: one closed decision table over
//! (image kind, bits per pixel, alpha bits, colormap shape).

use crate::error::TgaError;
use crate::header::{ImageKind, TgaHeader};
use crate::pixel::PixelLayout;

/// The canonical output format for one decode session. Immutable once
/// resolved; every row of the image goes through exactly this layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedFormat {
    pub layout: PixelLayout,
    /// The file is colormapped but the output is direct color (deep or
    /// oversized or alpha-carrying colormap).
    pub promoted_from_indexed: bool,
}

impl ResolvedFormat {
    pub(crate) fn channels(&self) -> usize {
        self.layout.bytes_per_pixel()
    }

    pub(crate) fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }
}

/// Correct known broken-header patterns, validate the sub-format, and
/// derive the output layout.
///
/// The corrections rewrite `header.alpha_bits` in place so that the rest
/// of the session sees only the fixed value.
pub(crate) fn resolve(header: &mut TgaHeader) -> Result<ResolvedFormat, TgaError> {
    // Some writers set the alpha nibble to the full pixel depth; others
    // leave it zero on formats that plainly carry alpha. Fix both before
    // validating.
    if header.alpha_bits == header.bits_per_pixel {
        header.alpha_bits = 0;
    }
    if header.alpha_bits == 0 {
        let inferred = match header.kind {
            ImageKind::Mapped => header.color_map_entry_bits == 32,
            ImageKind::Truecolor => header.bits_per_pixel == 32,
            ImageKind::Gray => header.bits_per_pixel == 16,
        };
        if inferred {
            header.alpha_bits = 8;
        }
    }

    let bpp = header.bits_per_pixel;
    let alpha = header.alpha_bits;

    let supported = match header.kind {
        // Alpha rides in the colormap entries, not the pixels; the nibble
        // only influences promotion below.
        ImageKind::Mapped => bpp == 8,
        ImageKind::Truecolor => {
            matches!((bpp, alpha), (15, 0) | (16, 0) | (16, 1) | (24, 0) | (32, 8))
        }
        ImageKind::Gray => matches!((bpp, alpha), (8, 0) | (15, 8) | (16, 8)),
    };
    if !supported {
        return Err(TgaError::UnsupportedSubformat {
            image_type: header.kind.code(),
            bits_per_pixel: bpp,
            alpha_bits: alpha,
        });
    }

    let mapped = header.kind == ImageKind::Mapped;
    if mapped && header.color_map_type != 1 {
        return Err(TgaError::InvalidColorMapType(header.color_map_type));
    }
    if !mapped && header.color_map_type != 0 {
        return Err(TgaError::InvalidColorMapType(header.color_map_type));
    }
    if mapped && !matches!(header.color_map_entry_bits, 15 | 16 | 24 | 32) {
        return Err(TgaError::UnsupportedColorMapDepth(
            header.color_map_entry_bits,
        ));
    }

    let (layout, promoted_from_indexed) = match header.kind {
        ImageKind::Mapped => {
            if header.color_map_entry_bits > 24 {
                // Per-index alpha cannot survive as a palette.
                (PixelLayout::Rgba8, true)
            } else if u32::from(header.color_map_index) + u32::from(header.color_map_length) > 256 {
                // More entries than an 8-bit palette can address.
                (PixelLayout::Rgb8, true)
            } else if alpha > 0 {
                (PixelLayout::Rgba8, true)
            } else {
                (PixelLayout::Indexed8, false)
            }
        }
        ImageKind::Truecolor if alpha > 0 => (PixelLayout::Rgba8, false),
        ImageKind::Truecolor => (PixelLayout::Rgb8, false),
        ImageKind::Gray if alpha > 0 => (PixelLayout::GrayAlpha8, false),
        ImageKind::Gray => (PixelLayout::Gray8, false),
    };

    Ok(ResolvedFormat {
        layout,
        promoted_from_indexed,
    })
}
