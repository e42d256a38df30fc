//! Indicator tasks: Wi-Fi status LED and the liveness heartbeat.
//!
//! Both are plain step functions driven by a thin `run` loop; each step
//! returns how long to sleep before the next one.

use crate::app::events::LinkEvent;
use crate::app::ports::{ClockPort, EventSink, OutputPort, WatchdogPort};
use crate::config::TimingConfig;
use crate::state::{CancelToken, ConnectivityFlag, Level};

// ── Status LED ───────────────────────────────────────────────

/// Blinks while the network is down, dark once it is up.
pub struct StatusLedTask<O, C, W> {
    led: O,
    clock: C,
    watchdog: W,
    flag: ConnectivityFlag,
    blink_ms: u32,
    connected_poll_ms: u32,
}

impl<O: OutputPort, C: ClockPort, W: WatchdogPort> StatusLedTask<O, C, W> {
    pub fn new(led: O, clock: C, watchdog: W, flag: ConnectivityFlag, timing: &TimingConfig) -> Self {
        Self {
            led,
            clock,
            watchdog,
            flag,
            blink_ms: timing.status_blink_ms,
            connected_poll_ms: timing.status_connected_poll_ms,
        }
    }

    pub fn led(&self) -> &O {
        &self.led
    }

    /// Update the LED once.  Returns the sleep before the next step.
    pub fn step(&mut self) -> u32 {
        if self.flag.is_connected() {
            if self.led.level().is_high() {
                self.led.set_level(Level::Low);
            }
            self.connected_poll_ms
        } else {
            let next = self.led.level().toggled();
            self.led.set_level(next);
            self.blink_ms
        }
    }

    pub fn run<S: EventSink>(&mut self, cancel: &CancelToken, sink: &mut S) {
        sink.emit(&LinkEvent::TaskStarted { task: "status-led" });
        while !cancel.is_cancelled() {
            self.watchdog.feed();
            let pause = self.step();
            self.clock.sleep_ms(pause);
        }
        self.led.set_level(Level::Low);
        sink.emit(&LinkEvent::TaskStopped { task: "status-led" });
    }
}

// ── Heartbeat ────────────────────────────────────────────────

/// Periodic "alive" log line, with an optional short pulse on a
/// dedicated pin.
pub struct HeartbeatTask<C, W> {
    clock: C,
    watchdog: W,
    pin: Option<Box<dyn OutputPort + Send>>,
    flag: Option<ConnectivityFlag>,
    interval_ms: u32,
    blink_ms: u32,
    beats: u64,
}

impl<C: ClockPort, W: WatchdogPort> HeartbeatTask<C, W> {
    pub fn new(clock: C, watchdog: W, timing: &TimingConfig) -> Self {
        Self {
            clock,
            watchdog,
            pin: None,
            flag: None,
            interval_ms: timing.heartbeat_interval_ms,
            blink_ms: timing.heartbeat_blink_ms.min(timing.heartbeat_interval_ms),
            beats: 0,
        }
    }

    /// Pulse `pin` HIGH for the blink time on every beat.
    pub fn with_pin(mut self, pin: Box<dyn OutputPort + Send>) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Include the network state in each beat.
    pub fn with_connectivity(mut self, flag: ConnectivityFlag) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// Emit one beat, pulsing the pin if present.
    pub fn beat<S: EventSink>(&mut self, sink: &mut S) {
        self.beats += 1;
        sink.emit(&LinkEvent::Heartbeat {
            uptime_ms: self.clock.now_ms(),
            connected: self.flag.as_ref().map(ConnectivityFlag::is_connected),
        });

        match self.pin.as_mut() {
            Some(pin) => {
                pin.set_level(Level::High);
                self.clock.sleep_ms(self.blink_ms);
                pin.set_level(Level::Low);
                self.clock.sleep_ms(self.interval_ms - self.blink_ms);
            }
            None => self.clock.sleep_ms(self.interval_ms),
        }
    }

    pub fn run<S: EventSink>(&mut self, cancel: &CancelToken, sink: &mut S) {
        sink.emit(&LinkEvent::TaskStarted { task: "heartbeat" });
        while !cancel.is_cancelled() {
            self.watchdog.feed();
            self.beat(sink);
        }
        sink.emit(&LinkEvent::TaskStopped { task: "heartbeat" });
    }
}
