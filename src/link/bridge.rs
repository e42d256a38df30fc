//! Network bridge: WebSocket text frames → UART command lines.
//!
//! | Frame  | UART line      | Reply        |
//! |--------|----------------|--------------|
//! | `ON`   | `turn_ON_led`  | `STATUS:ON`  |
//! | `OFF`  | `turn_OFF_led` | `STATUS:OFF` |
//! | `PING` |                | `PONG`       |
//!
//! Anything else produces no UART traffic and no reply.  The bridge also
//! remembers the last commanded status so a newly connected client can be
//! told where the output stands.  Concurrent clients are not arbitrated:
//! the last command wins.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::app::commands::NetCommand;
use crate::config::TokenTable;
use crate::state::Level;

const STATUS_UNKNOWN: u8 = 0;
const STATUS_OFF: u8 = 1;
const STATUS_ON: u8 = 2;

/// What to do with one recognised frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeAction<'a> {
    /// Send `line` on the UART; once it is accepted, record `status` and
    /// send `reply` to the client.
    Forward {
        line: &'a str,
        status: Level,
        reply: &'a str,
    },
    /// Answer the client directly.
    Reply(&'a str),
}

/// Frame mapping plus the shared last-status cell.
///
/// `Sync`: one instance serves every connection of the HTTP server.
pub struct NetworkBridge {
    tokens: TokenTable,
    announce_status: bool,
    status: AtomicU8,
}

impl NetworkBridge {
    pub fn new(tokens: TokenTable, announce_status: bool) -> Self {
        Self {
            tokens,
            announce_status,
            status: AtomicU8::new(STATUS_UNKNOWN),
        }
    }

    /// Map one text frame.  `None` for unrecognised frames.
    pub fn handle_text(&self, text: &str) -> Option<BridgeAction<'_>> {
        let command = NetCommand::parse(text, &self.tokens)?;
        Some(match command {
            NetCommand::On => BridgeAction::Forward {
                line: &self.tokens.led_on,
                status: Level::High,
                reply: &self.tokens.status_on,
            },
            NetCommand::Off => BridgeAction::Forward {
                line: &self.tokens.led_off,
                status: Level::Low,
                reply: &self.tokens.status_off,
            },
            NetCommand::Ping => BridgeAction::Reply(&self.tokens.net_pong),
        })
    }

    /// Record a status after its command line was accepted.
    pub fn record_status(&self, level: Level) {
        let code = if level.is_high() { STATUS_ON } else { STATUS_OFF };
        self.status.store(code, Ordering::Relaxed);
    }

    /// Last commanded status, if any command has been accepted yet.
    pub fn last_status(&self) -> Option<Level> {
        match self.status.load(Ordering::Relaxed) {
            STATUS_ON => Some(Level::High),
            STATUS_OFF => Some(Level::Low),
            _ => None,
        }
    }

    /// Messages for a newly connected client: the greeting, then the last
    /// status when one is known and announcing is enabled.
    pub fn on_connect(&self) -> heapless::Vec<&str, 2> {
        let mut out = heapless::Vec::new();
        let _ = out.push(self.tokens.greeting.as_str());
        if self.announce_status {
            match self.last_status() {
                Some(Level::High) => {
                    let _ = out.push(self.tokens.status_on.as_str());
                }
                Some(Level::Low) => {
                    let _ = out.push(self.tokens.status_off.as_str());
                }
                None => {}
            }
        }
        out
    }
}
