//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! [`LinkEvent`] to the ESP-IDF logger (UART0 console in production).
//! Lines are prefixed by subsystem: `LINK |`, `LED |`, `WS |`, `SYS |`.

use log::{debug, info, warn};

use crate::app::events::LinkEvent;
use crate::app::ports::EventSink;
use crate::state::Level;

/// Adapter that logs every [`LinkEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(level: Level) -> &'static str {
    if level.is_high() { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LinkEvent<'_>) {
        match event {
            LinkEvent::TaskStarted { task } => info!("SYS | {} started", task),
            LinkEvent::TaskStopped { task } => info!("SYS | {} stopped", task),
            LinkEvent::ExchangeSucceeded { request, rtt_ms } => {
                info!("LINK | {} answered in {} ms", request, rtt_ms);
            }
            LinkEvent::ExchangeTimedOut {
                request,
                expected,
                waited_ms,
            } => {
                warn!(
                    "LINK | no {} for {} after {} ms, continuing",
                    expected, request, waited_ms
                );
            }
            LinkEvent::StrayLine(line) => info!("LINK | ignoring unexpected line '{}'", line),
            LinkEvent::OutputApplied { level, changed } => {
                if *changed {
                    info!("LED | {}", on_off(*level));
                } else {
                    info!("LED | already {}", on_off(*level));
                }
            }
            LinkEvent::Replied { request, reply } => info!("LINK | {} -> {}", request, reply),
            LinkEvent::UnknownCommand(line) => warn!("LINK | unknown command '{}'", line),
            LinkEvent::ClientConnected => info!("WS | client connected"),
            LinkEvent::ClientDisconnected => info!("WS | client disconnected"),
            LinkEvent::FrameForwarded { frame, line } => info!("WS | {} -> UART {}", frame, line),
            LinkEvent::FrameAnswered { frame, reply } => info!("WS | {} -> {}", frame, reply),
            LinkEvent::FrameIgnored(text) => warn!("WS | unknown command '{}'", text),
            LinkEvent::QueueFull(line) => warn!("WS | UART queue full, dropped {}", line),
            LinkEvent::LineForwarded(line) => debug!("LINK | forwarded {}", line),
            LinkEvent::TransportFailed(e) => warn!("LINK | {}", e),
            LinkEvent::Heartbeat {
                uptime_ms,
                connected,
            } => match connected {
                Some(up) => info!(
                    "SYS | alive, uptime {} s, network {}",
                    uptime_ms / 1000,
                    if *up { "up" } else { "down" }
                ),
                None => info!("SYS | alive, uptime {} s", uptime_ms / 1000),
            },
        }
    }
}
