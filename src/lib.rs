//! Aera dual-controller firmware library.
//!
//! Two ESP32 boards share one UART link.  The top controller joins Wi-Fi,
//! serves a WebSocket control endpoint and probes the link with PING/PONG;
//! the bottom controller listens on the link and drives an LED.  Both
//! binaries are thin wiring over this library, and every module builds on
//! the host for tests.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod link;
pub mod pins;
pub mod state;

pub use error::{Error, Result};
