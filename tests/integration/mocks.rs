//! Mock adapters for integration tests.
//!
//! Time is simulated: [`ManualClock`] only advances when a task sleeps, and
//! [`ScriptedWire`] releases inbound bytes once the clock reaches their
//! timestamp.  A whole probe cycle therefore runs instantly and
//! deterministically.

use aera::app::events::LinkEvent;
use aera::app::ports::{ClockPort, EventSink, OutputPort, WatchdogPort};
use aera::link::transport::ByteChannel;
use aera::state::{CancelToken, Level};
use std::cell::Cell;
use std::collections::VecDeque;

// ── Clock ─────────────────────────────────────────────────────

pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── Wire ──────────────────────────────────────────────────────

/// Peer behaviour: when `request` is written, queue `reply` after `delay_ms`.
pub struct AutoReply {
    pub request: &'static str,
    pub reply: &'static str,
    pub delay_ms: u64,
}

/// Scripted peer on the far end of the link.
pub struct ScriptedWire<'c> {
    clock: &'c ManualClock,
    inbound: VecDeque<(u64, Vec<u8>)>,
    rules: Vec<AutoReply>,
    pending_tx: Vec<u8>,
    pub written: Vec<u8>,
    pub clears: u32,
}

#[allow(dead_code)]
impl<'c> ScriptedWire<'c> {
    pub fn new(clock: &'c ManualClock) -> Self {
        Self {
            clock,
            inbound: VecDeque::new(),
            rules: Vec::new(),
            pending_tx: Vec::new(),
            written: Vec::new(),
            clears: 0,
        }
    }

    /// Make `bytes` readable once the clock reaches `at_ms`.
    pub fn deliver_at(&mut self, at_ms: u64, bytes: &[u8]) {
        self.inbound.push_back((at_ms, bytes.to_vec()));
        self.inbound.make_contiguous().sort_by_key(|(t, _)| *t);
    }

    pub fn auto_reply(mut self, request: &'static str, reply: &'static str, delay_ms: u64) -> Self {
        self.rules.push(AutoReply {
            request,
            reply,
            delay_ms,
        });
        self
    }

    /// Lines written so far, without terminators.
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .split_terminator('\n')
            .map(str::to_owned)
            .collect()
    }
}

impl ByteChannel for ScriptedWire<'_> {
    type Error = ();

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        match self.inbound.front() {
            Some((at, _)) if *at <= self.clock.now_ms() => {}
            _ => return Ok(0),
        }
        let Some((at, mut bytes)) = self.inbound.pop_front() else {
            return Ok(0);
        };
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        if n < bytes.len() {
            self.inbound.push_front((at, bytes.split_off(n)));
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.written.extend_from_slice(data);
        self.pending_tx.extend_from_slice(data);

        while let Some(pos) = self.pending_tx.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending_tx.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]).into_owned();
            let now = self.clock.now_ms();
            let replies: Vec<(u64, Vec<u8>)> = self
                .rules
                .iter()
                .filter(|r| r.request == text)
                .map(|r| (now + r.delay_ms, format!("{}\n", r.reply).into_bytes()))
                .collect();
            for (at, bytes) in replies {
                self.deliver_at(at, &bytes);
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), ()> {
        let now = self.clock.now_ms();
        self.inbound.retain(|(at, _)| *at > now);
        self.clears += 1;
        Ok(())
    }
}

// ── Output pin ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPin {
    pub level: Level,
    pub history: Vec<Level>,
}

impl OutputPort for RecordingPin {
    fn set_level(&mut self, level: Level) {
        self.level = level;
        self.history.push(level);
    }

    fn level(&self) -> Level {
        self.level
    }
}

// ── Watchdog ──────────────────────────────────────────────────

#[derive(Default)]
pub struct CountingWatchdog {
    pub feeds: Cell<u32>,
}

impl WatchdogPort for CountingWatchdog {
    fn feed(&self) {
        self.feeds.set(self.feeds.get() + 1);
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Records every event as its `Debug` rendering.  Optionally cancels a
/// token once events starting with a prefix have been seen `after` times.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<String>,
    stop: Option<(&'static str, usize, CancelToken)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_after(prefix: &'static str, after: usize, token: CancelToken) -> Self {
        Self {
            events: Vec::new(),
            stop: Some((prefix, after, token)),
        }
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.contains(needle))
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LinkEvent<'_>) {
        self.events.push(format!("{event:?}"));
        if let Some((prefix, after, token)) = &self.stop {
            if self.count(prefix) >= *after {
                token.cancel();
            }
        }
    }
}
