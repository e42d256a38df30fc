//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements        | Connects to                 |
//! |--------------|-------------------|-----------------------------|
//! | `gpio`       | OutputPort        | embedded-hal output pin     |
//! | `log_sink`   | EventSink         | Serial log output           |
//! | `loopback`   | ByteChannel       | In-memory wire (host)       |
//! | `time`       | ClockPort         | ESP32 system timer          |
//! | `uart`       | ByteChannel       | ESP-IDF UART driver         |
//! | `wifi`       | ConnectivityPort  | ESP-IDF WiFi STA            |
//! | `ws_server`  |                   | ESP-IDF httpd WebSocket     |

pub mod gpio;
pub mod log_sink;
pub mod loopback;
pub mod time;
pub mod uart;
pub mod wifi;
pub mod ws_server;
