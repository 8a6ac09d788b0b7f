//! The fixed 18-byte TGA header, the 26-byte version-2 footer, and the
//! footer/extension probe.

use alloc::vec::Vec;

use crate::error::TgaError;

pub(crate) const HEADER_LEN: usize = 18;
pub(crate) const FOOTER_LEN: usize = 26;
pub(crate) const EXTENSION_LEN: usize = 495;

/// "TRUEVISION-XFILE." plus the trailing NUL, as stored in the last 18
/// bytes of every version-2 file.
pub(crate) const FOOTER_MAGIC: [u8; 18] = *b"TRUEVISION-XFILE.\0";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ImageKind {
    Mapped,
    Truecolor,
    Gray,
}

impl ImageKind {
    /// Uncompressed type code; RLE variants add 8.
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Mapped => 1,
            Self::Truecolor => 2,
            Self::Gray => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Compression {
    None,
    Rle,
}

/// Parsed 18-byte header.
///
/// `alpha_bits` starts as the raw descriptor nibble; the format resolver
/// rewrites it when correcting known broken-header patterns.
#[derive(Clone, Debug)]
pub(crate) struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub kind: ImageKind,
    pub compression: Compression,
    pub color_map_index: u16,
    pub color_map_length: u16,
    pub color_map_entry_bits: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    pub bytes_per_pixel: u8,
    pub alpha_bits: u8,
    pub flip_horizontal: bool,
    /// Rows are stored bottom-to-top. Descriptor bit 5 has the inverted
    /// sense: the bit CLEAR means this flag is set.
    pub flip_vertical: bool,
}

impl TgaHeader {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, TgaError> {
        if data.len() < HEADER_LEN {
            return Err(TgaError::TruncatedHeader);
        }
        let h = &data[..HEADER_LEN];

        let (kind, compression) = match h[2] {
            1 => (ImageKind::Mapped, Compression::None),
            2 => (ImageKind::Truecolor, Compression::None),
            3 => (ImageKind::Gray, Compression::None),
            9 => (ImageKind::Mapped, Compression::Rle),
            10 => (ImageKind::Truecolor, Compression::Rle),
            11 => (ImageKind::Gray, Compression::Rle),
            code => return Err(TgaError::UnsupportedImageType(code)),
        };

        let width = u16::from_le_bytes([h[12], h[13]]);
        let height = u16::from_le_bytes([h[14], h[15]]);
        if width == 0 {
            return Err(TgaError::InvalidHeader("TGA width is zero".into()));
        }
        if height == 0 {
            return Err(TgaError::InvalidHeader("TGA height is zero".into()));
        }

        let bits_per_pixel = h[16];
        let descriptor = h[17];

        Ok(Self {
            id_length: h[0],
            color_map_type: h[1],
            kind,
            compression,
            color_map_index: u16::from_le_bytes([h[3], h[4]]),
            color_map_length: u16::from_le_bytes([h[5], h[6]]),
            color_map_entry_bits: h[7],
            x_origin: u16::from_le_bytes([h[8], h[9]]),
            y_origin: u16::from_le_bytes([h[10], h[11]]),
            width,
            height,
            bits_per_pixel,
            bytes_per_pixel: bits_per_pixel.div_ceil(8),
            alpha_bits: descriptor & 0x0f,
            flip_horizontal: descriptor & 0x10 != 0,
            flip_vertical: descriptor & 0x20 == 0,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        let type_code = match self.compression {
            Compression::None => self.kind.code(),
            Compression::Rle => self.kind.code() + 8,
        };
        let mut descriptor = self.alpha_bits & 0x0f;
        if self.flip_horizontal {
            descriptor |= 0x10;
        }
        if !self.flip_vertical {
            descriptor |= 0x20;
        }

        out.push(self.id_length);
        out.push(self.color_map_type);
        out.push(type_code);
        out.extend_from_slice(&self.color_map_index.to_le_bytes());
        out.extend_from_slice(&self.color_map_length.to_le_bytes());
        out.push(self.color_map_entry_bits);
        out.extend_from_slice(&self.x_origin.to_le_bytes());
        out.extend_from_slice(&self.y_origin.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.push(self.bits_per_pixel);
        out.push(descriptor);
    }
}

/// Probe the tail of the file for a version-2 footer and, if one declares
/// an extension area, read past it.
///
/// The extension content is never interpreted. Any shortfall here (no
/// footer, no magic, an extension offset pointing outside the file) makes
/// the file a plain version-1 TGA; probing never fails a load and never
/// moves the main parse away from offset 0.
pub(crate) fn probe_footer(data: &[u8]) -> bool {
    let Some(footer_start) = data.len().checked_sub(FOOTER_LEN) else {
        return false;
    };
    let footer = &data[footer_start..];
    if footer[8..] != FOOTER_MAGIC {
        return false;
    }

    let offset = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]) as usize;
    if offset == 0 {
        // Signature only, no version-2 extension area.
        return true;
    }

    // Read and discard the fixed-size extension block.
    match offset.checked_add(EXTENSION_LEN) {
        Some(end) if end <= data.len() => true,
        _ => false,
    }
}
