//! Inbound command vocabularies.
//!
//! Two vocabularies exist: the UART line commands the bottom board
//! understands, and the WebSocket text frames the top board accepts.  Both
//! are resolved against the configured [`TokenTable`] by exact match on the
//! trimmed text.

use crate::config::TokenTable;

/// Commands carried on the board-to-board UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    /// `turn_ON_led`
    LedOn,
    /// `turn_OFF_led`
    LedOff,
    /// `PING`
    Ping,
    /// `PONG`
    Pong,
}

impl LinkCommand {
    pub fn parse(line: &str, tokens: &TokenTable) -> Option<Self> {
        let line = line.trim();
        if line == tokens.led_on.as_str() {
            Some(Self::LedOn)
        } else if line == tokens.led_off.as_str() {
            Some(Self::LedOff)
        } else if line == tokens.ping.as_str() {
            Some(Self::Ping)
        } else if line == tokens.pong.as_str() {
            Some(Self::Pong)
        } else {
            None
        }
    }

    pub fn token(self, tokens: &TokenTable) -> &str {
        match self {
            Self::LedOn => &tokens.led_on,
            Self::LedOff => &tokens.led_off,
            Self::Ping => &tokens.ping,
            Self::Pong => &tokens.pong,
        }
    }
}

/// Text frames accepted on the WebSocket control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetCommand {
    /// `ON`
    On,
    /// `OFF`
    Off,
    /// `PING`
    Ping,
}

impl NetCommand {
    pub fn parse(text: &str, tokens: &TokenTable) -> Option<Self> {
        let text = text.trim();
        if text == tokens.net_on.as_str() {
            Some(Self::On)
        } else if text == tokens.net_off.as_str() {
            Some(Self::Off)
        } else if text == tokens.net_ping.as_str() {
            Some(Self::Ping)
        } else {
            None
        }
    }
}
