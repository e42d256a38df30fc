//! Property tests for the line codec and the command vocabularies.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use aera::app::commands::LinkCommand;
use aera::config::TokenTable;
use aera::link::bridge::NetworkBridge;
use aera::link::codec::{Decoded, LineDecoder, MAX_LINE_LEN, encode_line};
use proptest::prelude::*;

/// Feed `bytes` through a decoder, collecting complete lines.
fn decode_all(decoder: &mut LineDecoder, bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    for &b in bytes {
        if let Some(Decoded::Line(text)) = decoder.push(b) {
            lines.push(text.to_owned());
        }
    }
    lines
}

fn token_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_:]{1,32}"
}

// ── Framing ──────────────────────────────────────────────────

proptest! {
    /// Whatever the split points, a sequence of encoded lines decodes back
    /// to the same sequence.
    #[test]
    fn lines_survive_arbitrary_chunking(
        texts in proptest::collection::vec(token_text(), 1..8),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let mut stream = Vec::new();
        for t in &texts {
            stream.extend_from_slice(&encode_line(t).unwrap());
        }

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len())).collect();
        points.sort_unstable();

        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        let mut start = 0;
        for p in points.into_iter().chain([stream.len()]) {
            lines.extend(decode_all(&mut decoder, &stream[start..p]));
            start = p;
        }

        prop_assert_eq!(lines, texts);
        prop_assert_eq!(decoder.pending(), 0);
    }

    /// An oversized line is discarded and the next line decodes cleanly.
    #[test]
    fn decoder_recovers_after_overflow(
        junk_len in (MAX_LINE_LEN + 1)..(MAX_LINE_LEN * 4),
        next in token_text(),
    ) {
        let mut stream = vec![b'x'; junk_len];
        stream.push(b'\n');
        stream.extend_from_slice(&encode_line(&next).unwrap());

        let mut decoder = LineDecoder::new();
        prop_assert_eq!(decode_all(&mut decoder, &stream), vec![next]);
    }

    /// Text with an embedded terminator is never encoded.
    #[test]
    fn embedded_newline_rejected(head in token_text(), tail in token_text()) {
        let text = format!("{head}\n{tail}");
        prop_assert!(encode_line(&text).is_err());
    }
}

// ── Vocabularies ─────────────────────────────────────────────

proptest! {
    /// Frames outside the vocabulary never reach the UART.
    #[test]
    fn unknown_frames_are_ignored(text in "[a-z0-9]{1,16}") {
        let bridge = NetworkBridge::new(TokenTable::default(), true);
        prop_assert!(bridge.handle_text(&text).is_none());
    }

    /// Lowercase text never matches a case-sensitive link command.
    #[test]
    fn link_commands_are_case_sensitive(text in "[a-z_]{1,16}") {
        prop_assert_eq!(LinkCommand::parse(&text, &TokenTable::default()), None);
    }
}
