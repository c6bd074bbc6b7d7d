//! Fuzz target: `mhz19::parse_response`
//!
//! Feeds arbitrary UART bytes to the CO₂ frame parser and asserts that an
//! accepted frame is exactly nine bytes with a valid checksum and a
//! plausible concentration.
//!
//! cargo fuzz run fuzz_mhz19_response

#![no_main]

use libfuzzer_sys::fuzz_target;
use kozatakip::sensors::mhz19::{self, FRAME_LEN, MAX_PPM};

fuzz_target!(|data: &[u8]| {
    if let Ok(ppm) = mhz19::parse_response(data) {
        assert_eq!(data.len(), FRAME_LEN);
        let mut frame = [0u8; FRAME_LEN];
        frame.copy_from_slice(data);
        assert_eq!(mhz19::checksum(&frame), frame[FRAME_LEN - 1]);
        assert!(ppm > 0 && ppm < MAX_PPM, "implausible ppm {ppm}");
    }
});
