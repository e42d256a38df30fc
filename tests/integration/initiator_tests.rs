//! Initiator task against a scripted peer and a manual clock.

use super::mocks::{CountingWatchdog, ManualClock, RecordingSink, ScriptedWire};
use aera::app::initiator::InitiatorTask;
use aera::app::ports::ClockPort;
use aera::config::SystemConfig;
use aera::link::channel::LineChannel;
use aera::link::exchange::ExchangeOutcome;
use aera::link::queue::{OutboundQueue, enqueue};
use aera::state::CancelToken;

fn config() -> SystemConfig {
    SystemConfig::default()
}

#[test]
fn pong_just_inside_deadline_succeeds() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock).auto_reply("PING", "PONG", 990);
    let mut sink = RecordingSink::new();
    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &config());

    let outcome = task.probe_once(&mut sink).unwrap();

    assert_eq!(outcome, ExchangeOutcome::Replied { rtt_ms: 990 });
    assert_eq!(task.stats().replies, 1);
    assert_eq!(sink.count("ExchangeSucceeded"), 1);
}

#[test]
fn pong_after_deadline_fails() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock).auto_reply("PING", "PONG", 1200);
    let mut sink = RecordingSink::new();
    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &config());

    let outcome = task.probe_once(&mut sink).unwrap();

    assert!(!outcome.is_success());
    assert_eq!(clock.now_ms(), 1000);
    assert_eq!(task.stats().timeouts, 1);
    assert_eq!(sink.count("ExchangeTimedOut"), 1);
}

#[test]
fn wrong_reply_is_a_failure() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock).auto_reply("PING", "PANG", 30);
    let mut sink = RecordingSink::new();
    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &config());

    let outcome = task.probe_once(&mut sink).unwrap();

    assert!(matches!(outcome, ExchangeOutcome::TimedOut { stray: 1, .. }));
    assert!(sink.contains("StrayLine(\"PANG\")"));
}

#[test]
fn stale_pong_is_drained_before_the_request() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"PONG\n");
    let mut sink = RecordingSink::new();
    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &config());

    let outcome = task.probe_once(&mut sink).unwrap();
    drop(task);

    assert!(!outcome.is_success());
    assert_eq!(wire.clears, 1);
}

#[test]
fn run_probes_every_interval_until_cancelled() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock).auto_reply("PING", "PONG", 40);
    let watchdog = CountingWatchdog::default();
    let cancel = CancelToken::new();
    let mut sink = RecordingSink::cancel_after("ExchangeSucceeded", 3, cancel.clone());

    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, &watchdog, &config());
    task.run(&cancel, &mut sink);
    let stats = task.stats();
    drop(task);

    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.replies, 3);
    // Probes start at 0, 2040 and 4080; the last reply lands 40 ms later.
    assert_eq!(clock.now_ms(), 4120);
    assert_eq!(wire.written_lines(), ["PING", "PING", "PING"]);
    assert!(watchdog.feeds.get() > 3);
    assert_eq!(sink.count("TaskStarted"), 1);
    assert_eq!(sink.count("TaskStopped"), 1);
}

#[test]
fn probe_disabled_still_forwards_queued_lines() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    let queue = OutboundQueue::new();
    enqueue(&queue, "turn_ON_led").unwrap();
    enqueue(&queue, "turn_OFF_led").unwrap();

    let mut cfg = config();
    cfg.timing.probe_enabled = false;
    let cancel = CancelToken::new();
    let mut sink = RecordingSink::cancel_after("LineForwarded", 2, cancel.clone());

    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &cfg)
        .with_outbound(&queue);
    task.run(&cancel, &mut sink);
    assert_eq!(task.stats().attempts, 0);
    drop(task);

    assert_eq!(wire.written_lines(), ["turn_ON_led", "turn_OFF_led"]);
}

#[test]
fn queued_line_is_forwarded_while_waiting_for_pong() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock).auto_reply("PING", "PONG", 40);
    let queue = OutboundQueue::new();
    enqueue(&queue, "turn_ON_led").unwrap();
    let mut sink = RecordingSink::new();

    let mut task = InitiatorTask::new(LineChannel::new(&mut wire), &clock, CountingWatchdog::default(), &config())
        .with_outbound(&queue);
    let outcome = task.probe_once(&mut sink).unwrap();
    assert_eq!(task.stats().forwarded, 1);
    drop(task);

    assert!(outcome.is_success());
    assert_eq!(wire.written_lines(), ["PING", "turn_ON_led"]);
    assert!(sink.contains("LineForwarded(\"turn_ON_led\")"));
}
