//! Newline-delimited line codec.
//!
//! Wire format:
//! ```text
//! ┌───────────────────────────┬────┐
//! │ ASCII text (1..=128 B)    │ \n │
//! └───────────────────────────┴────┘
//! ```
//!
//! The decoder accumulates bytes one at a time and yields complete lines
//! with surrounding whitespace (including a `\r` from CRLF senders)
//! removed.  A single transport read may carry part of a line, one line,
//! or several lines; the decoder keeps whatever is unterminated until the
//! next byte arrives.

use crate::error::LinkError;

/// Longest line payload accepted or emitted, excluding the terminator.
pub const MAX_LINE_LEN: usize = 128;

/// Line terminator.
pub const TERMINATOR: u8 = b'\n';

/// An owned, received line.
pub type Line = heapless::String<MAX_LINE_LEN>;

/// An encoded line ready for the transport (payload plus terminator).
pub type EncodedLine = heapless::Vec<u8, { MAX_LINE_LEN + 1 }>;

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// A complete, trimmed, non-blank line.
    Line(&'a str),
    /// A line exceeded [`MAX_LINE_LEN`]; it was discarded up to its
    /// terminator.
    Overflow,
    /// A terminated line was not valid UTF-8; it was discarded.
    Malformed,
}

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Accumulating payload bytes.
    Collecting,
    /// Payload overflowed; dropping bytes until the next terminator.
    Discarding,
    /// A line was just returned; the buffer is cleared on the next byte.
    Complete,
}

/// Streaming line decoder.
pub struct LineDecoder {
    state: DecoderState,
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: heapless::Vec::new(),
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some` when the byte completed (or aborted) a line.  A
    /// returned [`Decoded::Line`] borrows the decoder and is valid until
    /// the next call to `push`.  Blank lines are skipped silently.
    pub fn push(&mut self, byte: u8) -> Option<Decoded<'_>> {
        if self.state == DecoderState::Complete {
            self.buf.clear();
            self.state = DecoderState::Collecting;
        }

        if self.state == DecoderState::Discarding {
            if byte == TERMINATOR {
                self.state = DecoderState::Collecting;
                return Some(Decoded::Overflow);
            }
            return None;
        }

        if byte != TERMINATOR {
            if self.buf.push(byte).is_err() {
                self.buf.clear();
                self.state = DecoderState::Discarding;
            }
            return None;
        }

        let verdict = match core::str::from_utf8(&self.buf) {
            Ok(text) if text.trim().is_empty() => None,
            Ok(_) => Some(true),
            Err(_) => Some(false),
        };

        match verdict {
            None => {
                self.buf.clear();
                None
            }
            Some(false) => {
                self.buf.clear();
                Some(Decoded::Malformed)
            }
            Some(true) => {
                self.state = DecoderState::Complete;
                core::str::from_utf8(&self.buf)
                    .ok()
                    .map(|text| Decoded::Line(text.trim()))
            }
        }
    }

    /// Bytes held for an unterminated line.
    pub fn pending(&self) -> usize {
        match self.state {
            DecoderState::Collecting => self.buf.len(),
            DecoderState::Discarding | DecoderState::Complete => 0,
        }
    }

    /// Drop any partial line (e.g. after draining the transport).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = DecoderState::Collecting;
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `text` as a terminated line.
///
/// Fails when `text` contains a terminator or is longer than
/// [`MAX_LINE_LEN`].
pub fn encode_line(text: &str) -> Result<EncodedLine, LinkError> {
    if text.as_bytes().contains(&TERMINATOR) {
        return Err(LinkError::EmbeddedNewline);
    }
    if text.len() > MAX_LINE_LEN {
        return Err(LinkError::LineTooLong);
    }

    let mut out = EncodedLine::new();
    out.extend_from_slice(text.as_bytes())
        .map_err(|_| LinkError::LineTooLong)?;
    out.push(TERMINATOR).map_err(|_| LinkError::LineTooLong)?;
    Ok(out)
}
