//! Streaming TGA decoder.
//!
//! The pipeline per row: pull raw records (RLE or literal), flip
//! horizontally if the descriptor asks for it, then convert (upsample,
//! BGR reorder, colormap lookup, index rebase, or plain copy). Rows are
//! assembled into stripes and handed to a [`RowSink`] addressed in final
//! top-to-bottom coordinates, so bottom-up files cost one stripe of
//! buffering, never the whole image.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::convert;
use crate::error::TgaError;
use crate::format::{self, ResolvedFormat};
use crate::header::{self, Compression, ImageKind, TgaHeader};
use crate::info::TgaInfo;
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::reader::ByteReader;
use crate::rle::RleReader;

/// Rows per stripe unless overridden.
const DEFAULT_STRIPE_ROWS: usize = 64;

/// Receiver for decoded row stripes — the seam to whatever canvas the
/// caller stores pixels in.
pub trait RowSink {
    /// Called once, before any rows, with the resolved image facts and
    /// the palette when the output layout is [`PixelLayout::Indexed8`]
    /// (RGB triples, one per colormap entry).
    fn start(&mut self, _info: &TgaInfo, _palette: Option<&[u8]>) {}

    /// Receive `row_count` rows starting at `first_row`.
    ///
    /// Coordinates are final top-to-bottom positions and rows inside
    /// `pixels` run top-to-bottom; for a bottom-up file the stripes
    /// themselves arrive in reverse order.
    fn write_rows(&mut self, first_row: u32, row_count: u32, pixels: &[u8]);
}

/// Decoded image output. Pixels may be borrowed (zero-copy) or owned.
#[derive(Clone, Debug)]
pub struct DecodeOutput<'a> {
    pixels: Cow<'a, [u8]>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    palette: Option<Vec<u8>>,
}

impl<'a> DecodeOutput<'a> {
    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGB palette for [`PixelLayout::Indexed8`] output, `None` otherwise.
    pub fn palette(&self) -> Option<&[u8]> {
        self.palette.as_deref()
    }

    /// Take ownership of the pixel data (copies if borrowed).
    pub fn into_owned(self) -> DecodeOutput<'static> {
        DecodeOutput {
            pixels: Cow::Owned(self.pixels.into_owned()),
            width: self.width,
            height: self.height,
            layout: self.layout,
            palette: self.palette,
        }
    }

    /// Whether the pixel data is borrowed (zero-copy from input).
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Cow::Borrowed(_))
    }

    /// Reinterpret pixel data as a typed pixel slice.
    ///
    /// Returns [`TgaError::LayoutMismatch`] if the pixel layout doesn't
    /// match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], TgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        use rgb::AsPixels as _;

        if self.layout != P::layout() {
            return Err(TgaError::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, TgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, TgaError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// A TGA decode in the making.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    stripe_rows: usize,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            stripe_rows: DEFAULT_STRIPE_ROWS,
        }
    }

    /// Apply resource limits to this decode.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Rows buffered per stripe (bounds peak memory; cancellation is
    /// checked between stripes).
    pub fn with_stripe_rows(mut self, rows: usize) -> Self {
        self.stripe_rows = rows.max(1);
        self
    }

    /// Decode the whole image into a [`DecodeOutput`].
    ///
    /// Uncompressed, unflipped grayscale and indexed files decode
    /// zero-copy — the returned pixels borrow straight from the input.
    pub fn decode(self, stop: impl Stop) -> Result<DecodeOutput<'a>, TgaError> {
        stop.check()?;
        let mut session = Session::begin(self.data)?;
        let width = u32::from(session.header.width);
        let height = u32::from(session.header.height);
        if let Some(limits) = self.limits {
            limits.check(width, height)?;
        }

        let w = usize::from(session.header.width);
        let h = usize::from(session.header.height);
        let row_len = w
            .checked_mul(session.resolved.channels())
            .ok_or(TgaError::DimensionsTooLarge { width, height })?;
        let out_bytes = row_len
            .checked_mul(h)
            .ok_or(TgaError::DimensionsTooLarge { width, height })?;

        if session.is_zero_copy() {
            let pixels = session
                .reader
                .remaining()
                .get(..w * h)
                .ok_or(TgaError::TruncatedPixelData)?;
            return Ok(DecodeOutput {
                pixels: Cow::Borrowed(pixels),
                width,
                height,
                layout: session.resolved.layout,
                palette: session.palette.take(),
            });
        }

        if let Some(limits) = self.limits {
            limits.check_memory(out_bytes)?;
        }

        let mut sink = BufferSink {
            pixels: vec![0u8; out_bytes],
            row_len,
            palette: None,
        };
        session.stream(&mut sink, self.stripe_rows, &stop)?;
        Ok(DecodeOutput {
            pixels: Cow::Owned(sink.pixels),
            width,
            height,
            layout: session.resolved.layout,
            palette: sink.palette,
        })
    }

    /// Decode stripe by stripe into a caller-provided [`RowSink`].
    ///
    /// Memory stays bounded by one stripe plus the colormap; `stop` is
    /// consulted at every stripe boundary.
    pub fn decode_into(
        self,
        sink: &mut dyn RowSink,
        stop: impl Stop,
    ) -> Result<TgaInfo, TgaError> {
        stop.check()?;
        let mut session = Session::begin(self.data)?;
        let width = u32::from(session.header.width);
        let height = u32::from(session.header.height);
        if let Some(limits) = self.limits {
            limits.check(width, height)?;
            let stripe_rows = self.stripe_rows.min(usize::from(session.header.height));
            let stripe_bytes = usize::from(session.header.width)
                .checked_mul(session.resolved.channels())
                .and_then(|r| r.checked_mul(stripe_rows))
                .ok_or(TgaError::DimensionsTooLarge { width, height })?;
            limits.check_memory(stripe_bytes)?;
        }
        session.stream(sink, self.stripe_rows, &stop)
    }
}

/// One decode session: Start → HeaderRead → FormatResolved → ColormapRead →
/// StreamingRows, or Failed at any step with no partial output.
struct Session<'a> {
    reader: ByteReader<'a>,
    header: TgaHeader,
    resolved: ResolvedFormat,
    version2: bool,
    /// Converted lookup table for colormapped files promoted to direct
    /// color; entries are `resolved.channels()` wide.
    convert_cmap: Option<Vec<u8>>,
    /// RGB palette handed to the sink when the image stays indexed.
    palette: Option<Vec<u8>>,
}

impl<'a> Session<'a> {
    fn begin(data: &'a [u8]) -> Result<Self, TgaError> {
        // The footer probe is the one step that may fail silently: a
        // missing or unreadable version-2 tail makes this a version-1
        // file and the header parse below starts at offset 0 either way.
        let version2 = header::probe_footer(data);

        let mut header = TgaHeader::parse(data)?;
        let resolved = format::resolve(&mut header)?;

        let mut reader = ByteReader::new(data);
        reader
            .skip(header::HEADER_LEN)
            .ok_or(TgaError::TruncatedHeader)?;
        // Image ID field carries no pixel information.
        reader
            .skip(usize::from(header.id_length))
            .ok_or(TgaError::TruncatedPixelData)?;

        let mut convert_cmap = None;
        let mut palette = None;
        if header.kind == ImageKind::Mapped {
            let entry_len = usize::from(header.color_map_entry_bits.div_ceil(8));
            let raw_len = usize::from(header.color_map_length) * entry_len;
            let raw = reader
                .read_slice(raw_len)
                .ok_or(TgaError::TruncatedPixelData)?;
            if resolved.promoted_from_indexed {
                convert_cmap = Some(convert::convert_colormap(
                    raw,
                    header.color_map_entry_bits,
                    resolved.channels(),
                )?);
            } else {
                palette = Some(convert::convert_colormap(
                    raw,
                    header.color_map_entry_bits,
                    3,
                )?);
            }
        }

        Ok(Self {
            reader,
            header,
            resolved,
            version2,
            convert_cmap,
            palette,
        })
    }

    /// File bytes are already in canonical output form: uncompressed,
    /// no flips, one byte per pixel with nothing to rebase.
    fn is_zero_copy(&self) -> bool {
        self.header.compression == Compression::None
            && !self.header.flip_horizontal
            && !self.header.flip_vertical
            && match self.resolved.layout {
                PixelLayout::Gray8 => true,
                PixelLayout::Indexed8 => self.header.color_map_index == 0,
                _ => false,
            }
    }

    fn stream(
        &mut self,
        sink: &mut dyn RowSink,
        stripe_rows: usize,
        stop: &dyn Stop,
    ) -> Result<TgaInfo, TgaError> {
        let info = TgaInfo::from_parts(&self.header, self.resolved.layout, self.version2);
        let width = usize::from(self.header.width);
        let height = usize::from(self.header.height);
        let record_len = usize::from(self.header.bytes_per_pixel);
        let row_len = width
            .checked_mul(self.resolved.channels())
            .ok_or(TgaError::DimensionsTooLarge {
                width: info.width,
                height: info.height,
            })?;
        let stripe_rows = stripe_rows.min(height);
        let stripe_bytes =
            row_len
                .checked_mul(stripe_rows)
                .ok_or(TgaError::DimensionsTooLarge {
                    width: info.width,
                    height: info.height,
                })?;

        sink.start(&info, self.palette.as_deref());

        let mut stripe = vec![0u8; stripe_bytes];
        let mut raw_row = vec![0u8; width * record_len];
        let mut rle = RleReader::new();

        if self.header.flip_vertical {
            // Stored bottom-to-top: fill each stripe bottom-up and hand
            // stripes over in reverse order, remainder stripe first, so
            // the sink only ever sees final top-to-bottom coordinates.
            let mut consumed = 0;
            while consumed < height {
                stop.check()?;
                let rows = if consumed == 0 {
                    let remainder = height % stripe_rows;
                    if remainder == 0 { stripe_rows } else { remainder }
                } else {
                    stripe_rows
                };
                for y in 1..=rows {
                    let start = (rows - y) * row_len;
                    self.decode_row(&mut rle, &mut raw_row, &mut stripe[start..start + row_len])?;
                }
                let first_row = height - consumed - rows;
                sink.write_rows(first_row as u32, rows as u32, &stripe[..rows * row_len]);
                consumed += rows;
            }
        } else {
            let mut consumed = 0;
            while consumed < height {
                stop.check()?;
                let rows = stripe_rows.min(height - consumed);
                for y in 0..rows {
                    let start = y * row_len;
                    self.decode_row(&mut rle, &mut raw_row, &mut stripe[start..start + row_len])?;
                }
                sink.write_rows(consumed as u32, rows as u32, &stripe[..rows * row_len]);
                consumed += rows;
            }
        }

        Ok(info)
    }

    fn decode_row(
        &mut self,
        rle: &mut RleReader,
        raw_row: &mut [u8],
        out: &mut [u8],
    ) -> Result<(), TgaError> {
        let record_len = usize::from(self.header.bytes_per_pixel);

        match self.header.compression {
            Compression::Rle => rle.read_row(&mut self.reader, raw_row, record_len)?,
            Compression::None => {
                let raw = self
                    .reader
                    .read_slice(raw_row.len())
                    .ok_or(TgaError::TruncatedPixelData)?;
                raw_row.copy_from_slice(raw);
            }
        }

        if self.header.flip_horizontal {
            convert::flip_row(raw_row, record_len);
        }

        match self.header.kind {
            ImageKind::Truecolor => {
                if matches!(self.header.bits_per_pixel, 15 | 16) {
                    convert::upsample(out, raw_row, record_len, self.resolved.has_alpha());
                } else {
                    convert::bgr_to_rgb(out, raw_row, record_len, self.resolved.has_alpha());
                }
            }
            ImageKind::Mapped => {
                if let Some(cmap) = &self.convert_cmap {
                    convert::apply_colormap(
                        out,
                        raw_row,
                        cmap,
                        self.resolved.channels(),
                        self.header.color_map_index,
                        self.header.color_map_length,
                    )?;
                } else {
                    convert::apply_index_offset(out, raw_row, self.header.color_map_index);
                }
            }
            ImageKind::Gray => out.copy_from_slice(raw_row),
        }

        Ok(())
    }
}

/// Whole-image sink behind [`DecodeRequest::decode`].
struct BufferSink {
    pixels: Vec<u8>,
    row_len: usize,
    palette: Option<Vec<u8>>,
}

impl RowSink for BufferSink {
    fn start(&mut self, _info: &TgaInfo, palette: Option<&[u8]>) {
        self.palette = palette.map(<[u8]>::to_vec);
    }

    fn write_rows(&mut self, first_row: u32, _row_count: u32, pixels: &[u8]) {
        let start = first_row as usize * self.row_len;
        self.pixels[start..start + pixels.len()].copy_from_slice(pixels);
    }
}
