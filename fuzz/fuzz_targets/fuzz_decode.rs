#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Probe and full decode — must never panic
    let _ = zentarga::TgaInfo::from_bytes(data);
    let _ = zentarga::DecodeRequest::new(data).decode(enough::Unstoppable);
});
