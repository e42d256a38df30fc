//! Line-framed channel over a [`ByteChannel`].
//!
//! Owns the receive-side buffering: bytes pulled from the transport but not
//! yet consumed by a complete line stay here across calls, so a line split
//! over several reads (or several `read_line` calls) is reassembled intact.

use log::{debug, warn};

use super::codec::{Decoded, Line, LineDecoder, encode_line};
use super::transport::ByteChannel;
use crate::app::ports::ClockPort;
use crate::error::LinkError;

/// Transport read chunk.
const RX_CHUNK: usize = 64;

/// Line-oriented view of a byte channel.
pub struct LineChannel<T> {
    transport: T,
    decoder: LineDecoder,
    rx_buf: [u8; RX_CHUNK],
    rx_pos: usize,
    rx_len: usize,
}

impl<T: ByteChannel> LineChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            rx_buf: [0; RX_CHUNK],
            rx_pos: 0,
            rx_len: 0,
        }
    }

    /// Write `text` followed by the terminator, then flush.
    pub fn write_line(&mut self, text: &str) -> Result<(), LinkError> {
        let encoded = encode_line(text)?;
        let mut sent = 0;
        while sent < encoded.len() {
            match self.transport.write(&encoded[sent..]) {
                Ok(0) => return Err(LinkError::WriteFailed),
                Ok(n) => sent += n,
                Err(e) => {
                    warn!("LINK: write failed: {:?}", e);
                    return Err(LinkError::WriteFailed);
                }
            }
        }
        self.transport.flush().map_err(|e| {
            warn!("LINK: flush failed: {:?}", e);
            LinkError::WriteFailed
        })?;
        debug!("LINK: tx {}", text);
        Ok(())
    }

    /// Wait up to `timeout_ms` for one complete line.
    ///
    /// Returns `Ok(None)` when no terminator arrived in time; any partial
    /// line is retained for the next call.  Oversized and malformed lines
    /// are logged and skipped, and their time counts against the budget.
    pub fn read_line<C: ClockPort>(
        &mut self,
        clock: &C,
        timeout_ms: u32,
    ) -> Result<Option<Line>, LinkError> {
        let deadline = clock.now_ms().saturating_add(u64::from(timeout_ms));

        loop {
            while self.rx_pos < self.rx_len {
                let byte = self.rx_buf[self.rx_pos];
                self.rx_pos += 1;
                match self.decoder.push(byte) {
                    Some(Decoded::Line(text)) => {
                        let mut line = Line::new();
                        // Cannot fail: decoder lines never exceed the capacity.
                        let _ = line.push_str(text);
                        debug!("LINK: rx {}", line);
                        return Ok(Some(line));
                    }
                    Some(Decoded::Overflow) => warn!("LINK: oversized line discarded"),
                    Some(Decoded::Malformed) => warn!("LINK: non-UTF-8 line discarded"),
                    None => {}
                }
            }

            let now = clock.now_ms();
            if now >= deadline {
                return Ok(None);
            }
            let remaining = u32::try_from(deadline - now).unwrap_or(u32::MAX);

            let n = self
                .transport
                .read(&mut self.rx_buf, remaining)
                .map_err(|e| {
                    warn!("LINK: read failed: {:?}", e);
                    LinkError::ReadFailed
                })?;
            if n == 0 {
                return Ok(None);
            }
            self.rx_pos = 0;
            self.rx_len = n.min(RX_CHUNK);
        }
    }

    /// Discard buffered input on both sides of the channel, including any
    /// partial line.
    pub fn drain(&mut self) -> Result<(), LinkError> {
        self.rx_pos = 0;
        self.rx_len = 0;
        self.decoder.reset();
        self.transport.clear_input().map_err(|e| {
            warn!("LINK: clear input failed: {:?}", e);
            LinkError::ReadFailed
        })
    }

    /// Bytes received but not yet returned as part of a line.
    pub fn buffered(&self) -> usize {
        (self.rx_len - self.rx_pos) + self.decoder.pending()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}
