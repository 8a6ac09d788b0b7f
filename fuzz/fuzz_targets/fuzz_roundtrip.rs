#![no_main]
use libfuzzer_sys::fuzz_target;
use zentarga::*;

fuzz_target!(|data: &[u8]| {
    // If we can decode it, re-encoding and decoding again must produce
    // identical pixels
    let Ok(decoded) = DecodeRequest::new(data).decode(enough::Unstoppable) else {
        return;
    };

    let mut desc = ImageDescription::new(decoded.width, decoded.height, decoded.layout);
    if let Some(palette) = decoded.palette() {
        desc = desc.with_palette(palette);
    }

    // Degenerate palettes (for example zero entries) are not encodable;
    // skip those inputs
    let Ok(reencoded) = EncodeRequest::new().encode(&desc, decoded.pixels(), enough::Unstoppable)
    else {
        return;
    };

    let decoded2 = DecodeRequest::new(&reencoded)
        .decode(enough::Unstoppable)
        .expect("re-encoded data failed to decode");

    assert_eq!(decoded.pixels(), decoded2.pixels(), "roundtrip pixel mismatch");
    assert_eq!(decoded.width, decoded2.width);
    assert_eq!(decoded.height, decoded2.height);
    assert_eq!(decoded.layout, decoded2.layout);
});
