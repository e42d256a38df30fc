//! Outbound link events.
//!
//! The task loops emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Every failure path in the
//! firmware ends here: a diagnostic event, then the loop continues.

use crate::error::LinkError;
use crate::state::Level;

/// Structured events emitted by the task loops and the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent<'a> {
    /// A task loop entered its run loop.
    TaskStarted { task: &'static str },

    /// A task loop observed cancellation and returned.
    TaskStopped { task: &'static str },

    // ── Exchange (initiator) ──────────────────────────────────
    /// The expected reply arrived inside the deadline.
    ExchangeSucceeded { request: &'a str, rtt_ms: u64 },

    /// The deadline elapsed without the expected reply.
    ExchangeTimedOut { request: &'a str, expected: &'a str, waited_ms: u64 },

    /// A line arrived while waiting that was not the expected reply.
    StrayLine(&'a str),

    // ── Dispatch (responder) ──────────────────────────────────
    /// A recognised command drove the output.
    OutputApplied { level: Level, changed: bool },

    /// A request line was answered.
    Replied { request: &'a str, reply: &'a str },

    /// A line matched no known command.
    UnknownCommand(&'a str),

    // ── Bridge (network board) ────────────────────────────────
    /// A control client connected.
    ClientConnected,

    /// A control client disconnected.
    ClientDisconnected,

    /// A network frame was mapped to a UART command line.
    FrameForwarded { frame: &'a str, line: &'a str },

    /// A network frame was answered without UART traffic.
    FrameAnswered { frame: &'a str, reply: &'a str },

    /// A network frame matched no known token.
    FrameIgnored(&'a str),

    /// The outbound queue was full; the command line was dropped.
    QueueFull(&'a str),

    /// A queued command line was written to the UART.
    LineForwarded(&'a str),

    // ── Transport ─────────────────────────────────────────────
    /// The byte channel failed; the loop carries on.
    TransportFailed(LinkError),

    // ── Heartbeat ─────────────────────────────────────────────
    /// Periodic liveness tick.
    Heartbeat { uptime_ms: u64, connected: Option<bool> },
}
