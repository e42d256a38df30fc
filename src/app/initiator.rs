//! Initiator task: the UART owner on the network board.
//!
//! Runs the PING/PONG liveness probe on a fixed cadence and, in the gaps,
//! writes command lines queued by the network bridge.  No other task
//! touches this UART.
//!
//! ```text
//!  loop ─▶ probe (drain, PING, wait ≤ exchange_timeout for PONG)
//!    ▲        │ between polls: forward queued lines, feed watchdog
//!    │        ▼
//!    └── idle probe_interval in poll_interval slices
//!              (forward queued lines, feed watchdog, check cancel)
//! ```

use crate::app::events::LinkEvent;
use crate::app::ports::{ClockPort, EventSink, WatchdogPort};
use crate::config::{SystemConfig, TimingConfig, TokenTable};
use crate::error::LinkError;
use crate::link::channel::LineChannel;
use crate::link::exchange::{Exchange, ExchangeOutcome, ExchangeTiming};
use crate::link::queue::{self, OutboundQueue};
use crate::link::transport::ByteChannel;
use crate::state::CancelToken;

const TASK: &str = "initiator";

/// Running counters, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    pub attempts: u32,
    pub replies: u32,
    pub timeouts: u32,
    pub forwarded: u32,
}

pub struct InitiatorTask<'q, T, C, W> {
    channel: LineChannel<T>,
    clock: C,
    watchdog: W,
    tokens: TokenTable,
    timing: TimingConfig,
    outbound: Option<&'q OutboundQueue>,
    stats: ProbeStats,
}

impl<'q, T, C, W> InitiatorTask<'q, T, C, W>
where
    T: ByteChannel,
    C: ClockPort,
    W: WatchdogPort,
{
    pub fn new(channel: LineChannel<T>, clock: C, watchdog: W, config: &SystemConfig) -> Self {
        Self {
            channel,
            clock,
            watchdog,
            tokens: config.tokens.clone(),
            timing: config.timing,
            outbound: None,
            stats: ProbeStats::default(),
        }
    }

    /// Also forward lines queued by the network bridge.
    pub fn with_outbound(mut self, queue: &'q OutboundQueue) -> Self {
        self.outbound = Some(queue);
        self
    }

    pub fn stats(&self) -> ProbeStats {
        self.stats
    }

    /// One PING/PONG exchange.
    pub fn probe_once<S: EventSink>(&mut self, sink: &mut S) -> Result<ExchangeOutcome, LinkError> {
        let exchange = Exchange::new(
            &self.tokens.ping,
            &self.tokens.pong,
            ExchangeTiming::from_config(&self.timing),
        );
        let outbound = self.outbound;
        let watchdog = &self.watchdog;
        let mut forwarded = 0;

        self.stats.attempts = self.stats.attempts.wrapping_add(1);
        let outcome = exchange.run(&mut self.channel, &self.clock, sink, |channel, sink| {
            forwarded += forward_queued(outbound, channel, sink);
            watchdog.feed();
        });
        self.stats.forwarded = self.stats.forwarded.wrapping_add(forwarded);

        match outcome? {
            outcome @ ExchangeOutcome::Replied { .. } => {
                self.stats.replies = self.stats.replies.wrapping_add(1);
                Ok(outcome)
            }
            outcome @ ExchangeOutcome::TimedOut { .. } => {
                self.stats.timeouts = self.stats.timeouts.wrapping_add(1);
                Ok(outcome)
            }
        }
    }

    /// Write every queued bridge command now.  Returns how many were sent.
    pub fn forward_pending<S: EventSink>(&mut self, sink: &mut S) -> u32 {
        let sent = forward_queued(self.outbound, &mut self.channel, sink);
        self.stats.forwarded = self.stats.forwarded.wrapping_add(sent);
        sent
    }

    /// Wait out the inter-probe interval, servicing the queue every poll.
    fn idle<S: EventSink>(&mut self, cancel: &CancelToken, sink: &mut S) {
        let until = self
            .clock
            .now_ms()
            .saturating_add(u64::from(self.timing.probe_interval_ms));

        loop {
            self.forward_pending(sink);
            self.watchdog.feed();

            let now = self.clock.now_ms();
            if cancel.is_cancelled() || now >= until {
                return;
            }
            let remaining = u32::try_from(until - now).unwrap_or(u32::MAX);
            self.clock
                .sleep_ms(remaining.min(self.timing.poll_interval_ms.max(1)));
        }
    }

    /// Run until `cancel` fires.
    pub fn run<S: EventSink>(&mut self, cancel: &CancelToken, sink: &mut S) {
        sink.emit(&LinkEvent::TaskStarted { task: TASK });

        while !cancel.is_cancelled() {
            self.watchdog.feed();
            if self.timing.probe_enabled {
                if let Err(e) = self.probe_once(sink) {
                    sink.emit(&LinkEvent::TransportFailed(e));
                }
            }
            self.idle(cancel, sink);
        }

        sink.emit(&LinkEvent::TaskStopped { task: TASK });
    }
}

fn forward_queued<T: ByteChannel, S: EventSink>(
    queue: Option<&OutboundQueue>,
    channel: &mut LineChannel<T>,
    sink: &mut S,
) -> u32 {
    let Some(queue) = queue else {
        return 0;
    };

    let mut sent = 0;
    while let Some(line) = queue::dequeue(queue) {
        match channel.write_line(&line) {
            Ok(()) => {
                sent += 1;
                sink.emit(&LinkEvent::LineForwarded(&line));
            }
            Err(e) => sink.emit(&LinkEvent::TransportFailed(e)),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::queue::enqueue;
    use crate::link::transport::NullChannel;
    use core::cell::Cell;

    struct ManualClock(Cell<u64>);

    impl ClockPort for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }

        fn sleep_ms(&self, ms: u32) {
            self.0.set(self.0.get() + u64::from(ms));
        }
    }

    struct NoWatchdog;

    impl WatchdogPort for NoWatchdog {
        fn feed(&self) {}
    }

    struct Quiet;

    impl EventSink for Quiet {
        fn emit(&mut self, _event: &LinkEvent<'_>) {}
    }

    #[test]
    fn silent_peer_times_out() {
        let clock = ManualClock(Cell::new(0));
        let mut task = InitiatorTask::new(
            LineChannel::new(NullChannel),
            &clock,
            NoWatchdog,
            &SystemConfig::default(),
        );
        let outcome = task.probe_once(&mut Quiet).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(clock.now_ms(), 1000);
        assert_eq!(
            task.stats(),
            ProbeStats {
                attempts: 1,
                timeouts: 1,
                ..ProbeStats::default()
            }
        );
    }

    #[test]
    fn queued_lines_forwarded_without_probe() {
        let clock = ManualClock(Cell::new(0));
        let q = OutboundQueue::new();
        enqueue(&q, "turn_ON_led").unwrap();
        enqueue(&q, "turn_OFF_led").unwrap();
        let mut task = InitiatorTask::new(
            LineChannel::new(NullChannel),
            &clock,
            NoWatchdog,
            &SystemConfig::default(),
        )
        .with_outbound(&q);
        assert_eq!(task.forward_pending(&mut Quiet), 2);
        assert_eq!(task.stats().forwarded, 2);
        assert_eq!(task.forward_pending(&mut Quiet), 0);
    }
}
