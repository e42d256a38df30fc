//! Bottom controller: UART command listener driving the LED.
//!
//! ```text
//! ┌───────────────────────── Bottom controller ─────────────────────────┐
//! │                                                                     │
//! │  UART2 ──▶ LineChannel ──▶ ResponderTask ──▶ GpioOutput (LED)       │
//! │              ▲                  │                                   │
//! │              └── PONG ◀─────────┘ (on PING)                         │
//! │                                                                     │
//! │  HeartbeatTask ──▶ "alive" log (+ optional heartbeat pin)           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Result, anyhow};
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use log::info;

use aera::adapters::gpio::GpioOutput;
use aera::adapters::log_sink::LogEventSink;
use aera::adapters::time::SystemClock;
use aera::adapters::uart::{self, UartChannel};
use aera::app::heartbeat::HeartbeatTask;
use aera::app::responder::ResponderTask;
use aera::config::SystemConfig;
use aera::drivers::task_pin::{Core, spawn_on_core};
use aera::drivers::watchdog::Watchdog;
use aera::link::channel::LineChannel;
use aera::state::CancelToken;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Aera bottom controller v{}       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::from_build_env().map_err(aera::Error::from)?;
    Watchdog::configure(config.timing.watchdog_timeout_ms);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    let uart_driver = match config.uart.port {
        1 => uart::open_driver(peripherals.uart1, &config)?,
        2 => uart::open_driver(peripherals.uart2, &config)?,
        other => return Err(anyhow!("UART{} cannot carry the link", other)),
    };

    // SAFETY: each GPIO number is validated distinct at config load and
    // claimed exactly once here.
    let led_pin = PinDriver::output(unsafe { AnyOutputPin::new(config.pins.led_gpio) })?;
    let heartbeat_pin = config
        .pins
        .heartbeat_gpio
        .map(|gpio| PinDriver::output(unsafe { AnyOutputPin::new(gpio) }))
        .transpose()?;

    let cancel = CancelToken::never();

    // ── 4. UART listener (communication task) ─────────────────
    let responder = {
        let config = config.clone();
        let cancel = cancel.clone();
        spawn_on_core(Core::App, 5, 6, "uart-link\0", move || {
            let watchdog = Watchdog::subscribe("responder");
            let channel = LineChannel::new(UartChannel::new(uart_driver));
            let led = GpioOutput::new(led_pin, "led");
            let mut task = ResponderTask::new(channel, led, SystemClock::new(), watchdog, &config);
            task.run(&cancel, &mut LogEventSink::new());
        })?
    };

    // ── 5. Heartbeat ──────────────────────────────────────────
    let heartbeat = {
        let timing = config.timing;
        spawn_on_core(Core::App, 2, 4, "heartbeat\0", move || {
            let watchdog = Watchdog::subscribe("heartbeat");
            let mut task = HeartbeatTask::new(SystemClock::new(), watchdog, &timing);
            if let Some(pin) = heartbeat_pin {
                task = task.with_pin(Box::new(GpioOutput::new(pin, "heartbeat")));
            }
            task.run(&cancel, &mut LogEventSink::new());
        })?
    };

    info!("Bottom controller ready, listening for commands");

    responder
        .join()
        .map_err(|_| anyhow!("responder task panicked"))?;
    heartbeat
        .join()
        .map_err(|_| anyhow!("heartbeat task panicked"))?;
    Ok(())
}
