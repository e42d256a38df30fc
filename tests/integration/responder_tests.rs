//! Responder task against a scripted peer.

use super::mocks::{CountingWatchdog, ManualClock, RecordingPin, RecordingSink, ScriptedWire};
use aera::app::ports::ClockPort;
use aera::app::responder::ResponderTask;
use aera::config::SystemConfig;
use aera::link::channel::LineChannel;
use aera::state::{CancelToken, Level};

#[test]
fn repeated_on_keeps_output_high() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"turn_ON_led\n");
    wire.deliver_at(0, b"turn_ON_led\n");
    let mut sink = RecordingSink::new();

    let mut task = ResponderTask::new(
        LineChannel::new(&mut wire),
        RecordingPin::default(),
        &clock,
        CountingWatchdog::default(),
        &SystemConfig::default(),
    );
    assert!(task.service_once(&mut sink));
    assert!(task.service_once(&mut sink));

    assert_eq!(task.output().level, Level::High);
    assert!(sink.contains("OutputApplied { level: High, changed: true }"));
    assert!(sink.contains("OutputApplied { level: High, changed: false }"));
    drop(task);
    assert!(wire.written.is_empty());
}

#[test]
fn ping_is_answered_with_pong() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"PING\n");
    let mut sink = RecordingSink::new();

    let mut task = ResponderTask::new(
        LineChannel::new(&mut wire),
        RecordingPin::default(),
        &clock,
        CountingWatchdog::default(),
        &SystemConfig::default(),
    );
    assert!(task.service_once(&mut sink));
    assert!(task.output().history.is_empty());
    drop(task);

    assert_eq!(wire.written_lines(), ["PONG"]);
    assert_eq!(sink.count("Replied"), 1);
}

#[test]
fn unknown_line_changes_nothing() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"xyz123\n");
    let mut sink = RecordingSink::new();

    let mut task = ResponderTask::new(
        LineChannel::new(&mut wire),
        RecordingPin::default(),
        &clock,
        CountingWatchdog::default(),
        &SystemConfig::default(),
    );
    assert!(task.service_once(&mut sink));
    assert!(task.output().history.is_empty());
    drop(task);

    assert!(wire.written.is_empty());
    assert!(sink.contains("UnknownCommand(\"xyz123\")"));
}

#[test]
fn line_split_across_reads_is_reassembled() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"turn_O");
    wire.deliver_at(30, b"N_led\n");
    let mut sink = RecordingSink::new();

    let mut task = ResponderTask::new(
        LineChannel::new(&mut wire),
        RecordingPin::default(),
        &clock,
        CountingWatchdog::default(),
        &SystemConfig::default(),
    );
    assert!(!task.service_once(&mut sink));
    clock.advance(30);
    assert!(task.service_once(&mut sink));
    assert_eq!(task.output().level, Level::High);
}

#[test]
fn run_applies_commands_until_cancelled() {
    let clock = ManualClock::new();
    let mut wire = ScriptedWire::new(&clock);
    wire.deliver_at(0, b"turn_ON_led\n");
    wire.deliver_at(50, b"turn_OFF_led\n");
    let watchdog = CountingWatchdog::default();
    let cancel = CancelToken::new();
    let mut sink = RecordingSink::cancel_after("OutputApplied", 2, cancel.clone());

    let mut task = ResponderTask::new(
        LineChannel::new(&mut wire),
        RecordingPin::default(),
        &clock,
        &watchdog,
        &SystemConfig::default(),
    );
    task.run(&cancel, &mut sink);

    assert_eq!(task.output().history, [Level::High, Level::Low]);
    assert!(clock.now_ms() >= 50);
    assert!(watchdog.feeds.get() >= 2);
    assert_eq!(sink.count("TaskStopped"), 1);
}
