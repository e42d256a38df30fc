//! GPIO output adapter.
//!
//! Implements [`OutputPort`] over any `embedded-hal` 1.0 output pin.  On
//! the board this is an `esp_idf_hal::gpio::PinDriver` in output mode; host
//! tests use a recording mock.  The adapter remembers the level it last
//! drove so idempotent commands can be reported as such.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::OutputPort;
use crate::state::Level;

/// A digital output driven through `embedded-hal`.
pub struct GpioOutput<P> {
    pin: P,
    level: Level,
    label: &'static str,
}

impl<P: OutputPin> GpioOutput<P> {
    /// Wrap `pin` and drive it LOW.
    pub fn new(pin: P, label: &'static str) -> Self {
        let mut out = Self {
            pin,
            level: Level::Low,
            label,
        };
        out.drive(Level::Low);
        out
    }

    fn drive(&mut self, level: Level) {
        let result = match level {
            Level::High => self.pin.set_high(),
            Level::Low => self.pin.set_low(),
        };
        match result {
            Ok(()) => self.level = level,
            Err(e) => warn!("GPIO({}): drive {:?} failed: {:?}", self.label, level, e),
        }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputPort for GpioOutput<P> {
    fn set_level(&mut self, level: Level) {
        self.drive(level);
    }

    fn level(&self) -> Level {
        self.level
    }
}
