//! Default GPIO / peripheral assignments shared by both controller boards.
//!
//! Single source of truth for [`PinConfig::default`](crate::config::PinConfig).
//! Both boards are wired identically: UART2 crossed TX↔RX between them and
//! the on-board LED on GPIO 2.

// ---------------------------------------------------------------------------
// Board-to-board UART
// ---------------------------------------------------------------------------

/// UART peripheral number used for the board-to-board link.
pub const LINK_UART_NUM: u8 = 2;
/// UART TX pin (wired to the other board's RX).
pub const LINK_UART_TX_GPIO: i32 = 5;
/// UART RX pin (wired to the other board's TX).
pub const LINK_UART_RX_GPIO: i32 = 4;
/// Driver RX ring buffer size in bytes.
pub const LINK_UART_RX_BUF: usize = 1024;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// On-board LED.  On the bottom board this is the controlled output; on
/// the top board it is the Wi-Fi status indicator.
pub const LED_GPIO: i32 = 2;
