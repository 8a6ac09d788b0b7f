use crate::error::TgaError;
use crate::format;
use crate::header::{self, Compression, TgaHeader};
use crate::pixel::PixelLayout;

/// File extensions in use for TGA files.
pub const EXTENSIONS: [&str; 4] = ["tga", "vda", "icb", "vst"];

/// Header-level facts about a TGA file, resolved without touching pixel
/// data.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct TgaInfo {
    pub width: u32,
    pub height: u32,
    /// Layout the pixel rows decode to.
    pub layout: PixelLayout,
    /// Pixel data is run-length encoded.
    pub rle: bool,
    /// Rows are stored top-to-bottom (descriptor origin bit). Decoded rows
    /// are delivered top-to-bottom either way.
    pub origin_top_left: bool,
    /// The file ends in a version-2 footer signature.
    pub version2: bool,
}

impl TgaInfo {
    /// Probe a TGA header. This is the header-only fast path; no colormap
    /// or pixel bytes are read.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TgaError> {
        let version2 = header::probe_footer(data);
        let mut header = TgaHeader::parse(data)?;
        let resolved = format::resolve(&mut header)?;
        Ok(Self::from_parts(&header, resolved.layout, version2))
    }

    pub(crate) fn from_parts(header: &TgaHeader, layout: PixelLayout, version2: bool) -> Self {
        Self {
            width: u32::from(header.width),
            height: u32::from(header.height),
            layout,
            rle: header.compression == Compression::Rle,
            origin_top_left: !header.flip_vertical,
            version2,
        }
    }
}

/// Signature sniff: TGA has no leading magic, but version-2 files end in
/// the `TRUEVISION-XFILE.` signature.
pub fn matches_signature(data: &[u8]) -> bool {
    data.len() >= header::FOOTER_MAGIC.len()
        && data[data.len() - header::FOOTER_MAGIC.len()..] == header::FOOTER_MAGIC
}
