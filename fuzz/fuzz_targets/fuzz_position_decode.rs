#![no_main]
use desk_core::DeskPosition;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary notification payloads must never panic; payloads of
    // at least four bytes must decode and round-trip their leading bytes.
    match DeskPosition::decode(data) {
        Ok(pos) => {
            assert!(data.len() >= 4);
            assert_eq!(pos.to_payload().as_slice(), &data[..4]);
            // Height math stays in range for every raw offset.
            let cm = pos.height().as_cm();
            assert!((61.5..=717.0).contains(&cm));
        }
        Err(_) => assert!(data.len() < 4),
    }
});
