//! Both boards' link tasks on their own threads, joined by a loopback wire.

use super::mocks::{CountingWatchdog, RecordingPin, RecordingSink};
use aera::adapters::loopback::wire;
use aera::adapters::time::SystemClock;
use aera::adapters::uart::UartChannel;
use aera::app::initiator::InitiatorTask;
use aera::app::responder::ResponderTask;
use aera::config::{SystemConfig, TimingConfig};
use aera::drivers::task_pin::{Core, spawn_on_core};
use aera::link::channel::LineChannel;
use aera::state::CancelToken;

fn fast_config() -> SystemConfig {
    SystemConfig {
        timing: TimingConfig {
            read_timeout_ms: 10,
            exchange_timeout_ms: 500,
            poll_interval_ms: 5,
            probe_interval_ms: 30,
            ..TimingConfig::default()
        },
        ..SystemConfig::default()
    }
}

#[test]
fn ping_pong_over_simulated_uart() {
    let config = fast_config();
    let (top, bottom) = wire();
    let cancel = CancelToken::new();

    let responder = {
        let cancel = cancel.clone();
        let config = config.clone();
        spawn_on_core(Core::App, 5, 64, "uart-link\0", move || {
            let mut task = ResponderTask::new(
                LineChannel::new(UartChannel::simulated(bottom)),
                RecordingPin::default(),
                SystemClock::new(),
                CountingWatchdog::default(),
                &config,
            );
            let mut sink = RecordingSink::new();
            task.run(&cancel, &mut sink);
            sink
        })
        .unwrap()
    };

    let initiator = {
        let cancel = cancel.clone();
        spawn_on_core(Core::App, 5, 64, "uart-probe\0", move || {
            let mut task = InitiatorTask::new(
                LineChannel::new(UartChannel::simulated(top)),
                SystemClock::new(),
                CountingWatchdog::default(),
                &config,
            );
            let mut sink = RecordingSink::cancel_after("ExchangeSucceeded", 3, cancel.clone());
            task.run(&cancel, &mut sink);
            task.stats()
        })
        .unwrap()
    };

    let stats = initiator.join().unwrap();
    let responder_sink = responder.join().unwrap();

    assert_eq!(stats.replies, 3);
    assert!(responder_sink.count("Replied") >= 3);
    assert_eq!(responder_sink.count("TaskStopped"), 1);
}
