//! System configuration parameters
//!
//! Every pin number, token string and timing constant used by the two
//! controllers lives here and is injected into the tasks at startup.
//! Defaults reproduce the shipped wiring and protocol.  A JSON document can
//! override any subset of fields (see [`SystemConfig::from_json`]).

use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

/// Capacity of a single protocol token.
pub const TOKEN_CAP: usize = 32;

/// A protocol token (UART command or WebSocket text frame).
pub type Token = heapless::String<TOKEN_CAP>;

fn token(s: &str) -> Token {
    Token::try_from(s).unwrap_or_default()
}

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub pins: PinConfig,
    pub uart: UartConfig,
    pub timing: TimingConfig,
    pub tokens: TokenTable,
    pub network: NetworkConfig,
}

/// GPIO assignments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Controlled LED (bottom board) or Wi-Fi status LED (top board).
    pub led_gpio: i32,
    pub uart_tx_gpio: i32,
    pub uart_rx_gpio: i32,
    /// Optional dedicated heartbeat LED.  `None` keeps the heartbeat
    /// log-only so it never fights the controlled output.
    pub heartbeat_gpio: Option<i32>,
}

/// Board-to-board serial link settings (8N1, no flow control).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    pub port: u8,
    pub baud_rate: u32,
    pub rx_buffer_len: usize,
}

/// Loop and timeout budgets, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound on a single `read_line` call.
    pub read_timeout_ms: u32,
    /// Deadline for the reply to one request.
    pub exchange_timeout_ms: u32,
    /// Yield between polls and between loop iterations.
    pub poll_interval_ms: u32,
    /// Gap between consecutive PING probes.
    pub probe_interval_ms: u32,
    /// Periodic PING probe on the top board.  Disabled = pure bridge mode.
    pub probe_enabled: bool,
    /// Status LED half-period while Wi-Fi is down.
    pub status_blink_ms: u32,
    /// Status LED poll period while Wi-Fi is up.
    pub status_connected_poll_ms: u32,
    /// Heartbeat log period.
    pub heartbeat_interval_ms: u32,
    /// HIGH pulse width at the start of each heartbeat period (only with
    /// `pins.heartbeat_gpio`).  Capped at `heartbeat_interval_ms`.
    pub heartbeat_blink_ms: u32,
    /// Task watchdog timeout.
    pub watchdog_timeout_ms: u32,
}

/// Command vocabulary for both the UART link and the WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenTable {
    // --- UART ---
    pub ping: Token,
    pub pong: Token,
    pub led_on: Token,
    pub led_off: Token,

    // --- WebSocket inbound ---
    pub net_on: Token,
    pub net_off: Token,
    pub net_ping: Token,

    // --- WebSocket outbound ---
    pub status_on: Token,
    pub status_off: Token,
    pub net_pong: Token,
    pub greeting: Token,
}

/// Station-mode network identity.  Static addressing only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
    pub static_ip: [u8; 4],
    pub gateway: [u8; 4],
    pub netmask: [u8; 4],
    pub dns: [u8; 4],
    /// WebSocket control endpoint port.
    pub ws_port: u16,
    /// Send the last commanded `STATUS:*` after the greeting on connect.
    pub announce_status_on_connect: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            led_gpio: pins::LED_GPIO,
            uart_tx_gpio: pins::LINK_UART_TX_GPIO,
            uart_rx_gpio: pins::LINK_UART_RX_GPIO,
            heartbeat_gpio: None,
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            port: pins::LINK_UART_NUM,
            baud_rate: 115_200,
            rx_buffer_len: pins::LINK_UART_RX_BUF,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 20,
            exchange_timeout_ms: 1000,
            poll_interval_ms: 10,
            probe_interval_ms: 2000,
            probe_enabled: true,
            status_blink_ms: 100,
            status_connected_poll_ms: 500,
            heartbeat_interval_ms: 1000,
            heartbeat_blink_ms: 200,
            watchdog_timeout_ms: 10_000,
        }
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self {
            ping: token("PING"),
            pong: token("PONG"),
            led_on: token("turn_ON_led"),
            led_off: token("turn_OFF_led"),
            net_on: token("ON"),
            net_off: token("OFF"),
            net_ping: token("PING"),
            status_on: token("STATUS:ON"),
            status_off: token("STATUS:OFF"),
            net_pong: token("PONG"),
            greeting: token("CONNECTED:TOP_CONTROLLER"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: heapless::String::try_from(option_env!("AERA_WIFI_SSID").unwrap_or(""))
                .unwrap_or_default(),
            password: heapless::String::try_from(option_env!("AERA_WIFI_PASS").unwrap_or(""))
                .unwrap_or_default(),
            static_ip: [192, 168, 18, 200],
            gateway: [192, 168, 18, 1],
            netmask: [255, 255, 255, 0],
            dns: [8, 8, 8, 8],
            ws_port: 81,
            announce_status_on_connect: true,
        }
    }
}

impl SystemConfig {
    /// Parse an override document.  Missing fields keep their defaults.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overridden by the JSON document baked in at build time
    /// through `AERA_CONFIG` when that variable is set.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        match option_env!("AERA_CONFIG") {
            Some(doc) => Self::from_json(doc),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject values that would stall a loop or make tokens ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timing.read_timeout_ms"));
        }
        if t.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("timing.poll_interval_ms"));
        }
        if t.exchange_timeout_ms <= t.read_timeout_ms {
            return Err(ConfigError::Invalid("timing.exchange_timeout_ms"));
        }
        if t.probe_interval_ms < t.poll_interval_ms {
            return Err(ConfigError::Invalid("timing.probe_interval_ms"));
        }
        if t.status_blink_ms == 0 || t.status_connected_poll_ms == 0 {
            return Err(ConfigError::Invalid("timing.status_*"));
        }
        if t.heartbeat_interval_ms == 0 || t.heartbeat_blink_ms == 0 {
            return Err(ConfigError::Invalid("timing.heartbeat_*"));
        }
        // Longest sleep each task takes between two watchdog feeds.
        let gaps = [
            ("timing.read_timeout_ms", t.read_timeout_ms.saturating_add(t.poll_interval_ms)),
            ("timing.exchange_timeout_ms", t.exchange_timeout_ms),
            ("timing.status_blink_ms", t.status_blink_ms),
            ("timing.status_connected_poll_ms", t.status_connected_poll_ms),
            ("timing.heartbeat_interval_ms", t.heartbeat_interval_ms),
        ];
        for (field, gap) in gaps {
            if gap >= t.watchdog_timeout_ms {
                return Err(ConfigError::Invalid(field));
            }
        }

        if self.uart.baud_rate == 0 {
            return Err(ConfigError::Invalid("uart.baud_rate"));
        }
        if self.uart.rx_buffer_len < 256 {
            return Err(ConfigError::Invalid("uart.rx_buffer_len"));
        }
        let p = &self.pins;
        if p.uart_tx_gpio == p.uart_rx_gpio {
            return Err(ConfigError::Invalid("pins.uart_tx_gpio"));
        }
        if p.led_gpio == p.uart_tx_gpio || p.led_gpio == p.uart_rx_gpio {
            return Err(ConfigError::Invalid("pins.led_gpio"));
        }
        if p
            .heartbeat_gpio
            .is_some_and(|hb| hb == p.led_gpio || hb == p.uart_tx_gpio || hb == p.uart_rx_gpio)
        {
            return Err(ConfigError::Invalid("pins.heartbeat_gpio"));
        }

        self.tokens.validate()?;

        if self.network.prefix_len().is_none() {
            return Err(ConfigError::Invalid("network.netmask"));
        }
        if self.network.ws_port == 0 {
            return Err(ConfigError::Invalid("network.ws_port"));
        }
        Ok(())
    }
}

impl TokenTable {
    fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            ("tokens.ping", &self.ping),
            ("tokens.pong", &self.pong),
            ("tokens.led_on", &self.led_on),
            ("tokens.led_off", &self.led_off),
            ("tokens.net_on", &self.net_on),
            ("tokens.net_off", &self.net_off),
            ("tokens.net_ping", &self.net_ping),
            ("tokens.status_on", &self.status_on),
            ("tokens.status_off", &self.status_off),
            ("tokens.net_pong", &self.net_pong),
            ("tokens.greeting", &self.greeting),
        ];
        // Lines are trimmed before comparison, so a padded token never matches.
        for (field, tok) in all {
            if tok.is_empty() || tok.trim() != tok.as_str() || tok.contains('\n') {
                return Err(ConfigError::Invalid(field));
            }
        }

        let uart = [&self.ping, &self.pong, &self.led_on, &self.led_off];
        if has_duplicates(&uart) {
            return Err(ConfigError::Invalid("tokens (uart vocabulary)"));
        }
        let inbound = [&self.net_on, &self.net_off, &self.net_ping];
        if has_duplicates(&inbound) {
            return Err(ConfigError::Invalid("tokens (websocket vocabulary)"));
        }
        if self.status_on == self.status_off {
            return Err(ConfigError::Invalid("tokens.status_off"));
        }
        Ok(())
    }
}

fn has_duplicates(tokens: &[&Token]) -> bool {
    tokens
        .iter()
        .enumerate()
        .any(|(i, a)| tokens[i + 1..].iter().any(|b| a == b))
}

impl NetworkConfig {
    pub fn static_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.static_ip)
    }

    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.gateway)
    }

    pub fn dns(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dns)
    }

    /// CIDR prefix length of the netmask, or `None` if the mask has holes.
    pub fn prefix_len(&self) -> Option<u8> {
        let bits = u32::from_be_bytes(self.netmask);
        let ones = bits.leading_ones();
        if bits.checked_shl(ones).unwrap_or(0) != 0 {
            return None;
        }
        Some(ones as u8)
    }
}
