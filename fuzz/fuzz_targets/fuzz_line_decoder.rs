//! Fuzz target: `LineDecoder::push`
//!
//! Drives arbitrary bytes through the streaming line decoder and asserts
//! that it never panics, never yields a line longer than the cap or one
//! containing a terminator, and recovers after a reset.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use aera::link::codec::{Decoded, LineDecoder, MAX_LINE_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(Decoded::Line(text)) = decoder.push(b) {
            assert!(text.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert!(!text.is_empty(), "decoder must not yield blank lines");
            assert!(!text.contains('\n'));
        }
        assert!(decoder.pending() <= MAX_LINE_LEN);
    }

    // After a reset a clean line must decode.
    decoder.reset();
    let mut got = None;
    for &b in b"PING\n" {
        if let Some(Decoded::Line(text)) = decoder.push(b) {
            got = Some(text == "PING");
        }
    }
    assert_eq!(got, Some(true));
});
