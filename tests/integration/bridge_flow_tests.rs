//! WebSocket frame → outbound queue → UART → bottom board, end to end.

use super::mocks::{CountingWatchdog, RecordingPin, RecordingSink};
use aera::adapters::loopback::wire;
use aera::adapters::time::SystemClock;
use aera::adapters::uart::UartChannel;
use aera::adapters::ws_server::ControlEndpoint;
use aera::app::initiator::InitiatorTask;
use aera::app::responder::ResponderTask;
use aera::config::SystemConfig;
use aera::link::bridge::NetworkBridge;
use aera::link::channel::LineChannel;
use aera::link::queue::OutboundQueue;
use aera::state::Level;

#[test]
fn on_frame_turns_remote_led_on() {
    let config = SystemConfig::default();
    let queue = OutboundQueue::new();
    let endpoint = ControlEndpoint::new(NetworkBridge::new(config.tokens.clone(), true), &queue);
    let (top, bottom) = wire();
    let mut sink = RecordingSink::new();

    let mut initiator = InitiatorTask::new(
        LineChannel::new(UartChannel::simulated(top)),
        SystemClock::new(),
        CountingWatchdog::default(),
        &config,
    )
    .with_outbound(&queue);
    let mut responder = ResponderTask::new(
        LineChannel::new(UartChannel::simulated(bottom)),
        RecordingPin::default(),
        SystemClock::new(),
        CountingWatchdog::default(),
        &config,
    );

    assert_eq!(endpoint.on_text("ON", &mut sink), Some("STATUS:ON"));
    assert_eq!(endpoint.bridge().last_status(), Some(Level::High));
    assert_eq!(initiator.forward_pending(&mut sink), 1);
    assert!(responder.service_once(&mut sink));
    assert_eq!(responder.output().level, Level::High);

    assert_eq!(endpoint.on_text("OFF\0", &mut sink), Some("STATUS:OFF"));
    assert_eq!(initiator.forward_pending(&mut sink), 1);
    assert!(responder.service_once(&mut sink));
    assert_eq!(responder.output().level, Level::Low);
}

#[test]
fn garbage_frame_produces_no_uart_traffic() {
    let config = SystemConfig::default();
    let queue = OutboundQueue::new();
    let endpoint = ControlEndpoint::new(NetworkBridge::new(config.tokens.clone(), true), &queue);
    let (top, bottom) = wire();
    let probe = bottom.clone();
    let mut sink = RecordingSink::new();

    let mut initiator = InitiatorTask::new(
        LineChannel::new(UartChannel::simulated(top)),
        SystemClock::new(),
        CountingWatchdog::default(),
        &config,
    )
    .with_outbound(&queue);

    assert_eq!(endpoint.on_text("xyz123", &mut sink), None);
    assert_eq!(initiator.forward_pending(&mut sink), 0);
    assert_eq!(probe.available(), 0);
    assert_eq!(endpoint.bridge().last_status(), None);
    assert!(sink.contains("FrameIgnored(\"xyz123\")"));
}

#[test]
fn ping_frame_is_answered_locally() {
    let config = SystemConfig::default();
    let queue = OutboundQueue::new();
    let endpoint = ControlEndpoint::new(NetworkBridge::new(config.tokens.clone(), true), &queue);
    let mut sink = RecordingSink::new();

    assert_eq!(endpoint.on_text("PING", &mut sink), Some("PONG"));
    assert!(queue.try_receive().is_err());
}

#[test]
fn new_client_hears_greeting_then_last_status() {
    let config = SystemConfig::default();
    let queue = OutboundQueue::new();
    let endpoint = ControlEndpoint::new(NetworkBridge::new(config.tokens.clone(), true), &queue);
    let mut sink = RecordingSink::new();

    assert_eq!(endpoint.on_open(&mut sink).as_slice(), ["CONNECTED:TOP_CONTROLLER"]);
    endpoint.on_text("ON", &mut sink);
    assert_eq!(
        endpoint.on_open(&mut sink).as_slice(),
        ["CONNECTED:TOP_CONTROLLER", "STATUS:ON"]
    );
    endpoint.on_close(&mut sink);
    assert_eq!(sink.count("ClientConnected"), 2);
    assert_eq!(sink.count("ClientDisconnected"), 1);
}
