//! Test corpus: hand-built files, RLE packet properties, the sub-format
//! acceptance matrix, and orientation handling.

use enough::Unstoppable;
use zentarga::*;

fn checkerboard(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    for y in 0..h {
        for x in 0..w {
            let off = (y * w + x) * bpp;
            if (x + y) % 2 == 0 {
                for c in 0..bpp {
                    pixels[off + c] = 200 + (c as u8 * 20);
                }
            } else {
                for c in 0..bpp {
                    pixels[off + c] = 10 + (c as u8 * 30);
                }
            }
        }
    }
    pixels
}

fn noise_pattern(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    let mut state: u32 = 0xDEAD_BEEF;
    for p in pixels.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *p = state as u8;
    }
    pixels
}

/// Build a raw 18-byte header. `cmap` is (first index, length, entry bits).
fn tga_header(
    image_type: u8,
    cmap: Option<(u16, u16, u8)>,
    width: u16,
    height: u16,
    bpp: u8,
    descriptor: u8,
) -> Vec<u8> {
    let (cmap_type, (index, length, entry)) = match cmap {
        Some(c) => (1u8, c),
        None => (0, (0, 0, 0)),
    };
    let mut h = vec![0u8, cmap_type, image_type];
    h.extend_from_slice(&index.to_le_bytes());
    h.extend_from_slice(&length.to_le_bytes());
    h.push(entry);
    h.extend_from_slice(&[0; 4]); // x/y origin
    h.extend_from_slice(&width.to_le_bytes());
    h.extend_from_slice(&height.to_le_bytes());
    h.push(bpp);
    h.push(descriptor);
    h
}

const TOP_LEFT: u8 = 0x20;

// ── Hand-built files ─────────────────────────────────────────────────

#[test]
fn truecolor_24bit_stores_bgr() {
    // 2x2, raw, top-left. File records are BGR.
    let mut file = tga_header(2, None, 2, 2, 24, TOP_LEFT);
    file.extend_from_slice(&[
        0x00, 0x00, 0xFF, // red
        0x00, 0xFF, 0x00, // green
        0xFF, 0x00, 0x00, // blue
        0xFF, 0xFF, 0xFF, // white
    ]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgb8);
    assert_eq!(
        decoded.pixels(),
        &[
            0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, // top row: red green
            0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, // bottom row: blue white
        ]
    );
}

#[test]
fn repeat_run_of_200_pixels_is_two_packets() {
    let pixels: Vec<u8> = [1u8, 2, 3, 4].repeat(200);
    let desc = ImageDescription::new(200, 1, PixelLayout::Rgba8);
    let encoded = EncodeRequest::new()
        .origin_top_left(true)
        .encode(&desc, &pixels, Unstoppable)
        .unwrap();

    // 18-byte header, then exactly [255, record] + [199, record]: a full
    // 128-pixel repeat packet and a 72-pixel one. Records are BGRA.
    let data = &encoded[18..encoded.len() - 26];
    assert_eq!(data, &[255, 3, 2, 1, 4, 199, 3, 2, 1, 4]);
}

#[test]
fn oversized_colormap_promotes_to_rgb() {
    let mut file = tga_header(1, Some((0, 300, 24)), 4, 1, 8, TOP_LEFT);
    for i in 0..300u32 {
        // BGR entries
        file.push(i as u8);
        file.push((i / 2) as u8);
        file.push(255 - i as u8);
    }
    file.extend_from_slice(&[0, 1, 255, 44]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgb8);
    assert_eq!(decoded.palette(), None);
    assert_eq!(
        decoded.pixels(),
        &[
            255, 0, 0, // entry 0
            254, 0, 1, // entry 1
            0, 127, 255, // entry 255
            211, 22, 44, // entry 44
        ]
    );
}

#[test]
fn footer_with_zero_extension_offset() {
    let mut file = tga_header(3, None, 2, 2, 8, TOP_LEFT);
    file.extend_from_slice(&[9, 8, 7, 6]);
    file.extend_from_slice(&[0u8; 8]); // zero extension + developer offsets
    file.extend_from_slice(b"TRUEVISION-XFILE.\0");

    let info = TgaInfo::from_bytes(&file).unwrap();
    assert!(info.version2);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), &[9, 8, 7, 6]);
}

#[test]
fn bogus_extension_offset_falls_back_to_version1() {
    let mut file = tga_header(3, None, 2, 1, 8, TOP_LEFT);
    file.extend_from_slice(&[1, 2]);
    // Footer claims an extension area far past the end of the file.
    file.extend_from_slice(&9999u32.to_le_bytes());
    file.extend_from_slice(&[0u8; 4]);
    file.extend_from_slice(b"TRUEVISION-XFILE.\0");

    let info = TgaInfo::from_bytes(&file).unwrap();
    assert!(!info.version2);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), &[1, 2]);
}

#[test]
fn colormap_index_offsets_are_rebased() {
    // Palette indices start at 4 in the file; decoded indices start at 0.
    let mut file = tga_header(1, Some((4, 2, 24)), 2, 1, 8, TOP_LEFT);
    file.extend_from_slice(&[0, 0, 255, 0, 255, 0]); // BGR: red, green
    file.extend_from_slice(&[4, 5]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Indexed8);
    assert_eq!(decoded.pixels(), &[0, 1]);
    assert_eq!(decoded.palette(), Some(&[255, 0, 0, 0, 255, 0][..]));
}

// ── RLE properties ───────────────────────────────────────────────────

fn gray_rle_roundtrip(pixels: &[u8], w: u32, h: u32) -> Vec<u8> {
    let desc = ImageDescription::new(w, h, PixelLayout::Gray8);
    let encoded = EncodeRequest::new()
        .origin_top_left(true)
        .encode(&desc, pixels, Unstoppable)
        .unwrap();
    assert_packets_within_bounds(&encoded, 1, (w * h) as usize);
    let decoded = DecodeRequest::new(&encoded).decode(Unstoppable).unwrap();
    decoded.pixels().to_vec()
}

/// Walk the packet stream of an encoded file and check every declared
/// count is in 1..=128 and the records cover the image exactly.
fn assert_packets_within_bounds(encoded: &[u8], record_len: usize, total_pixels: usize) {
    let data = &encoded[18..encoded.len() - 26];
    let mut pos = 0usize;
    let mut pixels = 0usize;
    while pixels < total_pixels {
        let control = data[pos];
        pos += 1;
        let count = if control >= 128 {
            pos += record_len;
            usize::from(control) - 127
        } else {
            let count = usize::from(control) + 1;
            pos += count * record_len;
            count
        };
        assert!((1..=128).contains(&count), "packet count {count} out of range");
        pixels += count;
    }
    assert_eq!(pixels, total_pixels, "packets overrun the image");
    assert_eq!(pos, data.len(), "trailing bytes after the last packet");
}

#[test]
fn rle_idempotent_all_same() {
    for width in [1u32, 127, 128, 129, 256] {
        let pixels = vec![42u8; width as usize];
        assert_eq!(gray_rle_roundtrip(&pixels, width, 1), pixels, "width {width}");
    }
}

#[test]
fn rle_idempotent_all_distinct() {
    for width in [1u32, 127, 128, 129, 256] {
        let pixels: Vec<u8> = (0..width).map(|i| i as u8).collect();
        assert_eq!(gray_rle_roundtrip(&pixels, width, 1), pixels, "width {width}");
    }
}

#[test]
fn rle_idempotent_mixed_patterns() {
    // Alternating runs and literals of varying lengths.
    let mut pixels = Vec::new();
    for (value, run) in [(7u8, 3usize), (8, 1), (9, 1), (7, 130), (0, 2), (1, 128)] {
        pixels.extend(std::iter::repeat_n(value, run));
    }
    let width = pixels.len() as u32;
    assert_eq!(gray_rle_roundtrip(&pixels, width, 1), pixels);

    let noise = noise_pattern(129, 3, 1);
    assert_eq!(gray_rle_roundtrip(&noise, 129, 3), noise);

    let board = checkerboard(128, 2, 1);
    assert_eq!(gray_rle_roundtrip(&board, 128, 2), board);
}

#[test]
fn rle_packets_bounded_for_rgba_noise() {
    let pixels = noise_pattern(257, 2, 4);
    let desc = ImageDescription::new(257, 2, PixelLayout::Rgba8);
    let encoded = EncodeRequest::new()
        .origin_top_left(true)
        .encode(&desc, &pixels, Unstoppable)
        .unwrap();
    assert_packets_within_bounds(&encoded, 4, 257 * 2);
}

#[test]
fn rle_packet_may_span_rows() {
    // One 8-pixel repeat packet covering both rows of a 4x2 image.
    let mut file = tga_header(11, None, 4, 2, 8, TOP_LEFT);
    file.extend_from_slice(&[128 + 7, 5]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), &[5u8; 8][..]);
}

#[test]
fn rle_underrun_is_an_error() {
    // Repeat control byte with no record behind it.
    let mut file = tga_header(10, None, 4, 1, 24, TOP_LEFT);
    file.push(255);
    let result = DecodeRequest::new(&file).decode(Unstoppable);
    assert!(matches!(
        result.unwrap_err(),
        TgaError::UnexpectedEndOfStream
    ));
}

// ── Sample conversion ────────────────────────────────────────────────

#[test]
fn upsample_is_monotonic_and_full_range() {
    // 32 pixels sweeping the 5-bit blue channel of a 16-bit file.
    let mut file = tga_header(2, None, 32, 1, 16, TOP_LEFT);
    for v in 0..32u16 {
        file.extend_from_slice(&v.to_le_bytes());
    }

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgb8);
    let blues: Vec<u8> = decoded.pixels().chunks_exact(3).map(|p| p[2]).collect();
    assert_eq!(blues[0], 0);
    assert_eq!(blues[31], 255);
    for pair in blues.windows(2) {
        assert!(pair[0] < pair[1], "upsample not monotonic: {blues:?}");
    }
    // Red and green stay zero while only blue bits are set.
    for p in decoded.pixels().chunks_exact(3) {
        assert_eq!((p[0], p[1]), (0, 0));
    }
}

#[test]
fn upsample_reads_all_three_channels_and_alpha() {
    // ARGB1555 (one attribute bit, the only legal alpha depth at 16 bpp):
    // r=31, g=0, b=0 with the attribute bit set, then r=0, g=31, b=0
    // without it.
    let mut file = tga_header(2, None, 2, 1, 16, TOP_LEFT | 1);
    let p0: u16 = (1 << 15) | (31 << 10);
    let p1: u16 = 31 << 5;
    file.extend_from_slice(&p0.to_le_bytes());
    file.extend_from_slice(&p1.to_le_bytes());

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgba8);
    assert_eq!(decoded.pixels(), &[255, 0, 0, 255, 0, 255, 0, 0]);
}

// ── Format resolution matrix ─────────────────────────────────────────

fn resolve_layout(file: &[u8]) -> Result<PixelLayout, TgaError> {
    TgaInfo::from_bytes(file).map(|info| info.layout)
}

#[test]
fn truecolor_matrix() {
    let accept = [
        (15u8, 0u8, PixelLayout::Rgb8),
        (16, 0, PixelLayout::Rgb8),
        (16, 1, PixelLayout::Rgba8),
        (24, 0, PixelLayout::Rgb8),
        (32, 8, PixelLayout::Rgba8),
        (32, 0, PixelLayout::Rgba8), // alpha inferred for 32-bit color
    ];
    for (bpp, alpha, layout) in accept {
        let file = tga_header(2, None, 1, 1, bpp, TOP_LEFT | alpha);
        assert_eq!(resolve_layout(&file).unwrap(), layout, "bpp={bpp} alpha={alpha}");
    }

    for (bpp, alpha) in [(8u8, 0u8), (16, 2), (24, 1), (32, 4), (27, 0)] {
        let file = tga_header(2, None, 1, 1, bpp, TOP_LEFT | alpha);
        assert!(
            matches!(
                resolve_layout(&file).unwrap_err(),
                TgaError::UnsupportedSubformat { .. }
            ),
            "bpp={bpp} alpha={alpha} should be rejected"
        );
    }
}

#[test]
fn gray_matrix() {
    let accept = [
        (8u8, 0u8, PixelLayout::Gray8),
        (15, 8, PixelLayout::GrayAlpha8),
        (16, 8, PixelLayout::GrayAlpha8),
        (16, 0, PixelLayout::GrayAlpha8), // alpha inferred for 16-bit gray
    ];
    for (bpp, alpha, layout) in accept {
        let file = tga_header(3, None, 1, 1, bpp, TOP_LEFT | alpha);
        assert_eq!(resolve_layout(&file).unwrap(), layout, "bpp={bpp} alpha={alpha}");
    }

    for (bpp, alpha) in [(15u8, 0u8), (24, 0), (32, 8), (16, 4)] {
        let file = tga_header(3, None, 1, 1, bpp, TOP_LEFT | alpha);
        assert!(
            matches!(
                resolve_layout(&file).unwrap_err(),
                TgaError::UnsupportedSubformat { .. }
            ),
            "bpp={bpp} alpha={alpha} should be rejected"
        );
    }
}

#[test]
fn mapped_matrix() {
    // Stays indexed: small 24-bit palette, no alpha.
    let file = tga_header(1, Some((0, 16, 24)), 1, 1, 8, TOP_LEFT);
    assert_eq!(resolve_layout(&file).unwrap(), PixelLayout::Indexed8);

    // Deep palette entries promote to RGBA.
    let file = tga_header(1, Some((0, 16, 32)), 1, 1, 8, TOP_LEFT);
    assert_eq!(resolve_layout(&file).unwrap(), PixelLayout::Rgba8);

    // Descriptor alpha promotes to RGBA.
    let file = tga_header(1, Some((0, 16, 16)), 1, 1, 8, TOP_LEFT | 1);
    assert_eq!(resolve_layout(&file).unwrap(), PixelLayout::Rgba8);

    // Only 8-bit indices are handled.
    let file = tga_header(1, Some((0, 16, 24)), 1, 1, 16, TOP_LEFT);
    assert!(matches!(
        resolve_layout(&file).unwrap_err(),
        TgaError::UnsupportedSubformat { .. }
    ));

    // Entry depths outside 15/16/24/32.
    let file = tga_header(1, Some((0, 16, 13)), 1, 1, 8, TOP_LEFT);
    assert!(matches!(
        resolve_layout(&file).unwrap_err(),
        TgaError::UnsupportedColorMapDepth(13)
    ));
}

#[test]
fn colormap_type_must_match_image_type() {
    // Mapped image without a colormap.
    let mut file = tga_header(1, Some((0, 2, 24)), 1, 1, 8, TOP_LEFT);
    file[1] = 0; // colormap type
    assert!(matches!(
        resolve_layout(&file).unwrap_err(),
        TgaError::InvalidColorMapType(0)
    ));

    // Truecolor image claiming a colormap.
    let mut file = tga_header(2, None, 1, 1, 24, TOP_LEFT);
    file[1] = 1;
    assert!(matches!(
        resolve_layout(&file).unwrap_err(),
        TgaError::InvalidColorMapType(1)
    ));
}

#[test]
fn alpha_nibble_equal_to_depth_is_cleared() {
    // Some writers put the full pixel depth in the alpha nibble; 15-bit
    // color with "15 bits of alpha" must resolve as plain RGB.
    let file = tga_header(2, None, 1, 1, 15, TOP_LEFT | 15);
    assert_eq!(resolve_layout(&file).unwrap(), PixelLayout::Rgb8);

    // Gray 8-bit claiming 8 bits of alpha is the same disease.
    let file = tga_header(3, None, 1, 1, 8, TOP_LEFT | 8);
    assert_eq!(resolve_layout(&file).unwrap(), PixelLayout::Gray8);
}

#[test]
fn unknown_image_type_rejected() {
    for code in [0u8, 4, 5, 8, 12, 32, 255] {
        let file = tga_header(code, None, 1, 1, 24, TOP_LEFT);
        assert!(
            matches!(
                TgaInfo::from_bytes(&file).unwrap_err(),
                TgaError::UnsupportedImageType(c) if c == code
            ),
            "type code {code}"
        );
    }
}

// ── Orientation & streaming ──────────────────────────────────────────

#[test]
fn bottom_up_rows_are_delivered_top_to_bottom() {
    // Descriptor bit 5 clear: first stored row is the bottom of the image.
    let mut file = tga_header(3, None, 1, 2, 8, 0);
    file.extend_from_slice(&[10, 20]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), &[20, 10]);
}

#[test]
fn horizontal_flip_reverses_each_row() {
    let mut file = tga_header(3, None, 3, 2, 8, TOP_LEFT | 0x10);
    file.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

    let decoded = DecodeRequest::new(&file).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), &[3, 2, 1, 6, 5, 4]);
}

#[derive(Default)]
struct StripeLog {
    calls: Vec<(u32, u32)>,
    pixels: Vec<(u32, Vec<u8>)>,
}

impl RowSink for StripeLog {
    fn write_rows(&mut self, first_row: u32, row_count: u32, pixels: &[u8]) {
        self.calls.push((first_row, row_count));
        self.pixels.push((first_row, pixels.to_vec()));
    }
}

#[test]
fn flipped_stripes_arrive_in_reverse_order_with_remainder_first() {
    // 1x5 bottom-up gray image, 2-row stripes: expect the 1-row remainder
    // stripe for the bottom of the image first, then full stripes upward.
    let mut file = tga_header(3, None, 1, 5, 8, 0);
    file.extend_from_slice(&[50, 40, 30, 20, 10]); // stored bottom-to-top

    let mut sink = StripeLog::default();
    let info = DecodeRequest::new(&file)
        .with_stripe_rows(2)
        .decode_into(&mut sink, Unstoppable)
        .unwrap();

    assert_eq!(info.height, 5);
    assert_eq!(sink.calls, vec![(4, 1), (2, 2), (0, 2)]);

    let mut assembled = vec![0u8; 5];
    for (first_row, pixels) in &sink.pixels {
        assembled[*first_row as usize..*first_row as usize + pixels.len()]
            .copy_from_slice(pixels);
    }
    assert_eq!(assembled, &[10, 20, 30, 40, 50]);
}

#[test]
fn top_down_stripes_arrive_in_order() {
    let mut file = tga_header(3, None, 2, 5, 8, TOP_LEFT);
    file.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

    let mut sink = StripeLog::default();
    DecodeRequest::new(&file)
        .with_stripe_rows(2)
        .decode_into(&mut sink, Unstoppable)
        .unwrap();

    assert_eq!(sink.calls, vec![(0, 2), (2, 2), (4, 1)]);
}

// ── Error paths ──────────────────────────────────────────────────────

#[test]
fn truncated_header_rejected() {
    let file = tga_header(2, None, 1, 1, 24, TOP_LEFT);
    let result = DecodeRequest::new(&file[..10]).decode(Unstoppable);
    assert!(matches!(result.unwrap_err(), TgaError::TruncatedHeader));
}

#[test]
fn truncated_pixel_data_rejected() {
    let mut file = tga_header(2, None, 2, 2, 24, TOP_LEFT);
    file.extend_from_slice(&[0, 0, 0]); // one pixel of four
    let result = DecodeRequest::new(&file).decode(Unstoppable);
    assert!(matches!(result.unwrap_err(), TgaError::TruncatedPixelData));
}

#[test]
fn truncated_colormap_rejected() {
    let mut file = tga_header(1, Some((0, 8, 24)), 1, 1, 8, TOP_LEFT);
    file.extend_from_slice(&[0; 10]); // 24 bytes declared
    let result = DecodeRequest::new(&file).decode(Unstoppable);
    assert!(matches!(result.unwrap_err(), TgaError::TruncatedPixelData));
}

#[test]
fn out_of_range_colormap_index_rejected() {
    // Promoted colormap (32-bit entries) with a pixel past the table.
    let mut file = tga_header(1, Some((0, 2, 32)), 2, 1, 8, TOP_LEFT);
    file.extend_from_slice(&[0, 0, 0, 255, 1, 1, 1, 255]);
    file.extend_from_slice(&[0, 5]);
    let result = DecodeRequest::new(&file).decode(Unstoppable);
    assert!(matches!(
        result.unwrap_err(),
        TgaError::IndexOutOfRange { index: 5, length: 2 }
    ));
}

#[test]
fn zero_dimensions_rejected() {
    let file = tga_header(2, None, 0, 1, 24, TOP_LEFT);
    assert!(matches!(
        TgaInfo::from_bytes(&file).unwrap_err(),
        TgaError::InvalidHeader(_)
    ));
}
