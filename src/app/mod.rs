//! Application core: the task loops that run on each board.
//!
//! | Task        | Board    | Owns                         |
//! |-------------|----------|------------------------------|
//! | initiator   | top      | UART (probe + bridge output) |
//! | responder   | bottom   | UART, controlled LED         |
//! | status-led  | top      | Wi-Fi status LED             |
//! | heartbeat   | both     | optional heartbeat pin       |
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer testable without real peripherals.

pub mod commands;
pub mod events;
pub mod heartbeat;
pub mod initiator;
pub mod ports;
pub mod responder;
