//! Top controller: Wi-Fi, WebSocket bridge and UART link probe.
//!
//! ```text
//! ┌────────────────────────── Top controller ───────────────────────────┐
//! │                                                                     │
//! │  WS client ──▶ ControlEndpoint ──▶ OUTBOUND queue ──┐               │
//! │            ◀── STATUS / PONG / greeting             ▼               │
//! │                                       InitiatorTask ──▶ UART2       │
//! │                                        (PING/PONG probe)            │
//! │                                                                     │
//! │  WifiAdapter ──▶ ConnectivityFlag ──▶ StatusLedTask (GPIO 2)        │
//! │                                   └──▶ HeartbeatTask ("alive" log)  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::{Result, anyhow};
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use aera::adapters::gpio::GpioOutput;
use aera::adapters::log_sink::LogEventSink;
use aera::adapters::time::SystemClock;
use aera::adapters::uart::{self, UartChannel};
use aera::adapters::wifi::{self, ConnectivityPort, WifiAdapter};
use aera::adapters::ws_server::{self, ControlEndpoint};
use aera::app::heartbeat::{HeartbeatTask, StatusLedTask};
use aera::app::initiator::InitiatorTask;
use aera::app::ports::ClockPort;
use aera::config::SystemConfig;
use aera::drivers::task_pin::{Core, spawn_on_core};
use aera::drivers::watchdog::Watchdog;
use aera::link::bridge::NetworkBridge;
use aera::link::channel::LineChannel;
use aera::link::queue::OutboundQueue;
use aera::state::{CancelToken, ConnectivityFlag};

/// Lines from the WebSocket handler to the UART task.
static OUTBOUND: OutboundQueue = OutboundQueue::new();

/// Wi-Fi supervision period.
const NETWORK_POLL_MS: u32 = 1000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Aera top controller v{}          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::from_build_env().map_err(aera::Error::from)?;
    Watchdog::configure(config.timing.watchdog_timeout_ms);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let uart_driver = match config.uart.port {
        1 => uart::open_driver(peripherals.uart1, &config)?,
        2 => uart::open_driver(peripherals.uart2, &config)?,
        other => return Err(anyhow!("UART{} cannot carry the link", other)),
    };

    // SAFETY: the status LED GPIO is validated at config load and claimed
    // exactly once here.
    let status_pin = PinDriver::output(unsafe { AnyOutputPin::new(config.pins.led_gpio) })?;

    let cancel = CancelToken::never();
    let flag = ConnectivityFlag::new();

    // ── 4. Status LED ─────────────────────────────────────────
    let _status = {
        let flag = flag.clone();
        let cancel = cancel.clone();
        let timing = config.timing;
        spawn_on_core(Core::App, 2, 4, "status-led\0", move || {
            let watchdog = Watchdog::subscribe("status-led");
            let led = GpioOutput::new(status_pin, "status");
            let mut task = StatusLedTask::new(led, SystemClock::new(), watchdog, flag, &timing);
            task.run(&cancel, &mut LogEventSink::new());
        })?
    };

    // ── 5. Heartbeat (log only) ───────────────────────────────
    let _heartbeat = {
        let flag = flag.clone();
        let cancel = cancel.clone();
        let timing = config.timing;
        spawn_on_core(Core::App, 2, 4, "heartbeat\0", move || {
            let watchdog = Watchdog::subscribe("heartbeat");
            let mut task =
                HeartbeatTask::new(SystemClock::new(), watchdog, &timing).with_connectivity(flag);
            task.run(&cancel, &mut LogEventSink::new());
        })?
    };

    // ── 6. UART link (communication task) ─────────────────────
    let _initiator = {
        let config = config.clone();
        let cancel = cancel.clone();
        spawn_on_core(Core::App, 5, 6, "uart-link\0", move || {
            let watchdog = Watchdog::subscribe("initiator");
            let channel = LineChannel::new(UartChannel::new(uart_driver));
            let mut task = InitiatorTask::new(channel, SystemClock::new(), watchdog, &config)
                .with_outbound(&OUTBOUND);
            task.run(&cancel, &mut LogEventSink::new());
        })?
    };

    // ── 7. Wi-Fi (static address) ─────────────────────────────
    let driver = wifi::build_static_sta(peripherals.modem, sysloop, Some(nvs), &config.network)?;
    let mut wifi = WifiAdapter::from_config(flag, &config.network).map_err(aera::Error::from)?;
    wifi.attach(driver);
    if let Err(e) = wifi.connect() {
        warn!("WiFi: initial connect failed ({}), retrying in background", e);
    }

    // ── 8. WebSocket endpoint + supervision loop ──────────────
    let endpoint = Arc::new(ControlEndpoint::new(
        NetworkBridge::new(
            config.tokens.clone(),
            config.network.announce_status_on_connect,
        ),
        &OUTBOUND,
    ));
    let mut server = None;
    let clock = SystemClock::new();

    info!("Top controller ready");

    // Not subscribed to the TWDT: a blocking association attempt can
    // outlast the watchdog timeout.
    loop {
        wifi.poll(clock.now_ms());

        if server.is_none() && wifi.is_connected() {
            match ws_server::start(Arc::clone(&endpoint), config.network.ws_port) {
                Ok(s) => server = Some(s),
                Err(e) => warn!("WS: {}, retrying", e),
            }
        }

        clock.sleep_ms(NETWORK_POLL_MS);
    }
}
