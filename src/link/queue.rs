//! Outbound command queue: network handler → UART owner.
//!
//! The WebSocket handler runs on the HTTP server's task and must not touch
//! the UART, which belongs to the initiator task.  Command lines cross over
//! through this bounded `embassy-sync` channel; the initiator drains it
//! between polls.
//!
//! ```text
//! ┌──────────────┐  OutboundLine  ┌────────────────┐
//! │  WS handler  │──────────────▶│ Initiator task │──▶ UART
//! │  (httpd)     │   depth 8      │  (UART owner)  │
//! └──────────────┘                └────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::TOKEN_CAP;

/// Channel depth for queued command lines.
pub const OUTBOUND_DEPTH: usize = 8;

/// A command line waiting for the UART.
pub type OutboundLine = heapless::String<TOKEN_CAP>;

/// Queue from the network bridge to the UART-owning task.
pub type OutboundQueue = Channel<CriticalSectionRawMutex, OutboundLine, OUTBOUND_DEPTH>;

/// Why a line could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue holds [`OUTBOUND_DEPTH`] lines already.
    Full,
    /// The line exceeds [`TOKEN_CAP`].
    TooLong,
}

/// Queue `line` without blocking.
pub fn enqueue(queue: &OutboundQueue, line: &str) -> Result<(), EnqueueError> {
    let owned = OutboundLine::try_from(line).map_err(|_| EnqueueError::TooLong)?;
    queue.try_send(owned).map_err(|_| EnqueueError::Full)
}

/// Take the oldest queued line, if any.
pub fn dequeue(queue: &OutboundQueue) -> Option<OutboundLine> {
    queue.try_receive().ok()
}
