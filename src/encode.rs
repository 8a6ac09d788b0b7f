//! TGA encoder.
//!
//! Header fields derive from the input layout via a fixed table; rows are
//! pulled from a [`RowSource`] one at a time — in reverse for the default
//! bottom-left origin — swizzled to the file's BGR order, optionally
//! RLE-packed, and followed by the fixed version-2 footer.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::convert;
use crate::error::TgaError;
use crate::header::{Compression, FOOTER_MAGIC, ImageKind, TgaHeader};
use crate::pixel::PixelLayout;
use crate::rle;

/// Caller-side description of the image to encode.
#[derive(Clone, Debug)]
pub struct ImageDescription<'a> {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    /// RGB triples for `Indexed8` / `IndexedAlpha8` input.
    pub palette: Option<&'a [u8]>,
    /// Layer count of the source document. TGA holds exactly one layer;
    /// anything else must be flattened by the caller first.
    pub layers: u32,
}

impl<'a> ImageDescription<'a> {
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
            palette: None,
            layers: 1,
        }
    }

    pub fn with_palette(mut self, palette: &'a [u8]) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }
}

/// Provider of input rows — the seam to the caller's canvas.
pub trait RowSource {
    /// Fill `out` with `row_count` rows starting at `first_row`, in the
    /// image's top-to-bottom order and the layout declared in the
    /// [`ImageDescription`]. The encoder requests rows bottom-up when
    /// writing a bottom-left-origin file.
    fn read_rows(&mut self, first_row: u32, row_count: u32, out: &mut [u8]);
}

/// Encode options: RLE on by default, bottom-left origin by default.
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    rle: bool,
    origin_top_left: bool,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeRequest {
    pub fn new() -> Self {
        Self {
            rle: true,
            origin_top_left: false,
        }
    }

    /// Run-length encode the pixel data (default true).
    pub fn rle(mut self, rle: bool) -> Self {
        self.rle = rle;
        self
    }

    /// Store rows top-to-bottom instead of the format's default
    /// bottom-to-top (default false).
    pub fn origin_top_left(mut self, top_left: bool) -> Self {
        self.origin_top_left = top_left;
        self
    }

    /// Encode from a contiguous top-to-bottom pixel buffer.
    pub fn encode(
        &self,
        desc: &ImageDescription<'_>,
        pixels: &[u8],
        stop: impl Stop,
    ) -> Result<Vec<u8>, TgaError> {
        let row_len = desc
            .layout
            .bytes_per_pixel()
            .checked_mul(desc.width as usize)
            .ok_or(TgaError::DimensionsTooLarge {
                width: desc.width,
                height: desc.height,
            })?;
        let expected = row_len
            .checked_mul(desc.height as usize)
            .ok_or(TgaError::DimensionsTooLarge {
                width: desc.width,
                height: desc.height,
            })?;
        if pixels.len() < expected {
            return Err(TgaError::BufferTooSmall {
                needed: expected,
                actual: pixels.len(),
            });
        }

        let mut source = SliceSource { pixels, row_len };
        self.encode_rows(desc, &mut source, stop)
    }

    /// Encode by pulling rows from a [`RowSource`].
    pub fn encode_rows(
        &self,
        desc: &ImageDescription<'_>,
        source: &mut dyn RowSource,
        stop: impl Stop,
    ) -> Result<Vec<u8>, TgaError> {
        if desc.layers != 1 {
            return Err(TgaError::MultipleLayersUnsupported);
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(TgaError::InvalidHeader(
                "cannot encode an empty image".into(),
            ));
        }
        if desc.width > u32::from(u16::MAX) || desc.height > u32::from(u16::MAX) {
            return Err(TgaError::DimensionsTooLarge {
                width: desc.width,
                height: desc.height,
            });
        }

        stop.check()?;

        let width = desc.width as usize;
        let height = desc.height as usize;
        let layout = desc.layout;
        let in_len = layout.bytes_per_pixel();
        let kind_table = KindTable::for_layout(layout);
        let record_len = usize::from(kind_table.bits_per_pixel) / 8;

        let palette = match layout {
            PixelLayout::Indexed8 | PixelLayout::IndexedAlpha8 => {
                let palette = desc
                    .palette
                    .ok_or_else(|| TgaError::InvalidPalette("indexed input needs a palette".into()))?;
                if palette.len() % 3 != 0 {
                    return Err(TgaError::InvalidPalette(
                        "palette must be RGB triples".into(),
                    ));
                }
                let num_colors = palette.len() / 3;
                // IndexedAlpha8 reserves one slot for the transparent entry.
                let max_colors = if layout == PixelLayout::IndexedAlpha8 {
                    255
                } else {
                    256
                };
                if num_colors == 0 || num_colors > max_colors {
                    return Err(TgaError::InvalidPalette(alloc::format!(
                        "palette has {num_colors} colors, supported range is 1..={max_colors}"
                    )));
                }
                Some(palette)
            }
            _ => None,
        };
        let num_colors = palette.map_or(0, |p| p.len() / 3);

        let map_entries = match layout {
            PixelLayout::Indexed8 => num_colors,
            PixelLayout::IndexedAlpha8 => num_colors + 1,
            _ => 0,
        };

        let header = TgaHeader {
            id_length: 0,
            color_map_type: u8::from(kind_table.kind == ImageKind::Mapped),
            kind: kind_table.kind,
            compression: if self.rle {
                Compression::Rle
            } else {
                Compression::None
            },
            color_map_index: 0,
            color_map_length: map_entries as u16,
            color_map_entry_bits: kind_table.map_entry_bits,
            x_origin: 0,
            y_origin: if self.origin_top_left {
                desc.height as u16
            } else {
                0
            },
            width: desc.width as u16,
            height: desc.height as u16,
            bits_per_pixel: kind_table.bits_per_pixel,
            bytes_per_pixel: kind_table.bits_per_pixel / 8,
            alpha_bits: kind_table.alpha_bits,
            flip_horizontal: false,
            flip_vertical: !self.origin_top_left,
        };

        let map_bytes = map_entries * usize::from(kind_table.map_entry_bits) / 8;
        let estimate = crate::header::HEADER_LEN
            + map_bytes
            + width
                .checked_mul(height)
                .and_then(|wh| wh.checked_mul(record_len))
                .ok_or(TgaError::DimensionsTooLarge {
                    width: desc.width,
                    height: desc.height,
                })?
            + crate::header::FOOTER_LEN;
        let mut out = Vec::with_capacity(estimate);

        header.write(&mut out);

        match layout {
            PixelLayout::Indexed8 => {
                if let Some(palette) = palette {
                    for entry in palette.chunks_exact(3) {
                        out.push(entry[2]);
                        out.push(entry[1]);
                        out.push(entry[0]);
                    }
                }
            }
            PixelLayout::IndexedAlpha8 => {
                if let Some(palette) = palette {
                    for entry in palette.chunks_exact(3) {
                        out.push(entry[2]);
                        out.push(entry[1]);
                        out.push(entry[0]);
                        out.push(255);
                    }
                    // The reserved fully transparent slot.
                    out.extend_from_slice(&[0, 0, 0, 0]);
                }
            }
            _ => {}
        }

        let mut pixels = vec![0u8; width * in_len];
        let mut data = vec![0u8; width * record_len];

        for row in 0..height {
            if row % 16 == 0 {
                stop.check()?;
            }

            let src_row = if self.origin_top_left {
                row
            } else {
                height - 1 - row
            };
            source.read_rows(src_row as u32, 1, &mut pixels);

            match layout {
                PixelLayout::Rgb8 => convert::bgr_to_rgb(&mut data, &pixels, 3, false),
                PixelLayout::Rgba8 => convert::bgr_to_rgb(&mut data, &pixels, 4, true),
                PixelLayout::IndexedAlpha8 => {
                    // Anything at most half transparent collapses to the
                    // reserved index; TGA keeps no per-pixel alpha in
                    // colormapped files.
                    for (out_px, in_px) in data.iter_mut().zip(pixels.chunks_exact(2)) {
                        *out_px = if in_px[1] > 127 {
                            in_px[0]
                        } else {
                            num_colors as u8
                        };
                    }
                }
                _ => data.copy_from_slice(&pixels),
            }

            if self.rle {
                rle::encode_row(&mut out, &data, record_len);
            } else {
                out.extend_from_slice(&data);
            }
        }

        // Footer must be the last thing written: no extension area, no
        // developer directory, then the signature.
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&FOOTER_MAGIC);

        Ok(out)
    }
}

/// Fixed header fields per encodable layout.
struct KindTable {
    kind: ImageKind,
    bits_per_pixel: u8,
    alpha_bits: u8,
    map_entry_bits: u8,
}

impl KindTable {
    fn for_layout(layout: PixelLayout) -> Self {
        match layout {
            PixelLayout::Indexed8 => Self {
                kind: ImageKind::Mapped,
                bits_per_pixel: 8,
                alpha_bits: 0,
                map_entry_bits: 24,
            },
            PixelLayout::IndexedAlpha8 => Self {
                kind: ImageKind::Mapped,
                bits_per_pixel: 8,
                alpha_bits: 0,
                map_entry_bits: 32,
            },
            PixelLayout::Gray8 => Self {
                kind: ImageKind::Gray,
                bits_per_pixel: 8,
                alpha_bits: 0,
                map_entry_bits: 0,
            },
            PixelLayout::GrayAlpha8 => Self {
                kind: ImageKind::Gray,
                bits_per_pixel: 16,
                alpha_bits: 8,
                map_entry_bits: 0,
            },
            PixelLayout::Rgb8 => Self {
                kind: ImageKind::Truecolor,
                bits_per_pixel: 24,
                alpha_bits: 0,
                map_entry_bits: 0,
            },
            PixelLayout::Rgba8 => Self {
                kind: ImageKind::Truecolor,
                bits_per_pixel: 32,
                alpha_bits: 8,
                map_entry_bits: 0,
            },
        }
    }
}

/// Row source over a contiguous top-to-bottom buffer.
struct SliceSource<'a> {
    pixels: &'a [u8],
    row_len: usize,
}

impl RowSource for SliceSource<'_> {
    fn read_rows(&mut self, first_row: u32, _row_count: u32, out: &mut [u8]) {
        let start = first_row as usize * self.row_len;
        out.copy_from_slice(&self.pixels[start..start + out.len()]);
    }
}
