//! UART byte channel adapter.
//!
//! Implements [`ByteChannel`] for the board-to-board serial link.
//!
//! - **`target_os = "espidf"`**: wraps `esp_idf_hal::uart::UartDriver`
//!   (8N1, no flow control, RX ring buffer sized from config).  A read
//!   returns whatever the ring buffer already holds without waiting; only
//!   an empty buffer blocks, and then only until the first byte arrives.
//! - **`not(target_os = "espidf")`**: backed by a
//!   [`WireEnd`](super::loopback::WireEnd) so two simulated boards can be
//!   cabled together in-process.

use crate::link::transport::ByteChannel;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::{BLOCK, NON_BLOCK, TickType},
    uart::UartDriver,
};

#[cfg(target_os = "espidf")]
pub type UartError = esp_idf_svc::sys::EspError;

#[cfg(not(target_os = "espidf"))]
pub type UartError = super::loopback::WireError;

/// The board-to-board serial port.
pub struct UartChannel {
    #[cfg(target_os = "espidf")]
    driver: UartDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    wire: super::loopback::WireEnd,
}

#[cfg(target_os = "espidf")]
impl UartChannel {
    pub fn new(driver: UartDriver<'static>) -> Self {
        Self { driver }
    }
}

#[cfg(not(target_os = "espidf"))]
impl UartChannel {
    /// A simulated port attached to one end of an in-memory wire.
    pub fn simulated(wire: super::loopback::WireEnd) -> Self {
        Self { wire }
    }
}

#[cfg(target_os = "espidf")]
impl ByteChannel for UartChannel {
    type Error = UartError;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let waiting = self.driver.remaining_read()?;
        if waiting > 0 {
            let n = waiting.min(buf.len());
            return self.driver.read(&mut buf[..n], NON_BLOCK);
        }
        let ticks = TickType::new_millis(u64::from(timeout_ms)).ticks();
        self.driver.read(&mut buf[..1], ticks)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        self.driver.write(data)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        self.driver.wait_tx_done(BLOCK)
    }

    fn clear_input(&mut self) -> Result<(), UartError> {
        self.driver.clear_rx()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ByteChannel for UartChannel {
    type Error = UartError;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        self.wire.read(buf, timeout_ms)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        self.wire.write(data)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        self.wire.flush()
    }

    fn clear_input(&mut self) -> Result<(), UartError> {
        self.wire.clear_input()
    }
}

/// Install the UART driver on `uart` using the configured pins and rate.
#[cfg(target_os = "espidf")]
pub fn open_driver<U>(
    uart: impl esp_idf_hal::peripheral::Peripheral<P = U> + 'static,
    config: &crate::config::SystemConfig,
) -> Result<UartDriver<'static>, crate::error::Error>
where
    U: esp_idf_hal::uart::Uart,
{
    use esp_idf_hal::gpio::AnyIOPin;
    use esp_idf_hal::uart::config::Config;
    use esp_idf_hal::units::Hertz;

    let uart_config = Config::new()
        .baudrate(Hertz(config.uart.baud_rate))
        .rx_fifo_size(config.uart.rx_buffer_len);

    // SAFETY: pin numbers are validated at config load and each is claimed
    // by this driver only; no other driver in the firmware takes them.
    let (tx, rx) = unsafe {
        (
            AnyIOPin::new(config.pins.uart_tx_gpio),
            AnyIOPin::new(config.pins.uart_rx_gpio),
        )
    };

    let driver = UartDriver::new(
        uart,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )
    .map_err(|e| {
        log::error!("UART{}: driver install failed: {:?}", config.uart.port, e);
        crate::error::Error::Init("uart driver install")
    })?;

    log::info!(
        "UART{}: {} baud, TX=GPIO{} RX=GPIO{}",
        config.uart.port,
        config.uart.baud_rate,
        config.pins.uart_tx_gpio,
        config.pins.uart_rx_gpio
    );
    Ok(driver)
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::adapters::loopback::wire;

    #[test]
    fn simulated_port_round_trips_through_wire() {
        let (near, mut far) = wire();
        let mut port = UartChannel::simulated(near);
        port.write(b"turn_OFF_led\n").unwrap();

        let mut buf = [0u8; 32];
        let n = far.read(&mut buf, 10).unwrap();
        assert_eq!(&buf[..n], b"turn_OFF_led\n");

        far.write(b"PONG\n").unwrap();
        let n = port.read(&mut buf, 10).unwrap();
        assert_eq!(&buf[..n], b"PONG\n");
    }
}
