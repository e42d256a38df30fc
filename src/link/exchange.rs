//! Request/reply exchange with a wall-clock deadline.
//!
//! One exchange: drain stale input, send the request line, then poll for
//! the expected reply until the deadline.
//!
//! ```text
//!   drain ─▶ send ─▶ ┌─ read_line(read_timeout) ─┐
//!                    │   expected?  ──▶ Replied   │
//!                    │   other line ──▶ stray     │
//!                    │   deadline?  ──▶ TimedOut  │
//!                    └── between_polls, sleep ◀───┘
//! ```
//!
//! Only the elapsed time since the send bounds the wait.  Each read is
//! given whatever is left of the deadline (at most `read_timeout_ms`), and
//! a reply that still lands after the deadline counts as a timeout.

use super::channel::LineChannel;
use super::transport::ByteChannel;
use crate::app::events::LinkEvent;
use crate::app::ports::{ClockPort, EventSink};
use crate::config::TimingConfig;
use crate::error::LinkError;

/// Timing knobs for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeTiming {
    /// Total wait for the reply, measured from the send.
    pub timeout_ms: u32,
    /// Bound on each individual line read.
    pub read_timeout_ms: u32,
    /// Pause between reads.
    pub poll_interval_ms: u32,
}

impl ExchangeTiming {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            timeout_ms: timing.exchange_timeout_ms,
            read_timeout_ms: timing.read_timeout_ms,
            poll_interval_ms: timing.poll_interval_ms,
        }
    }
}

impl Default for ExchangeTiming {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The expected reply arrived `rtt_ms` after the send.
    Replied { rtt_ms: u64 },
    /// The deadline passed; `stray` other lines were seen meanwhile.
    TimedOut { waited_ms: u64, stray: u32 },
}

impl ExchangeOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Replied { .. })
    }
}

/// One request line and the reply that satisfies it.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'t> {
    pub request: &'t str,
    pub expected: &'t str,
    pub timing: ExchangeTiming,
}

impl<'t> Exchange<'t> {
    pub fn new(request: &'t str, expected: &'t str, timing: ExchangeTiming) -> Self {
        Self {
            request,
            expected,
            timing,
        }
    }

    /// Run the exchange to completion.
    ///
    /// `between_polls` runs once per poll with the channel and sink
    /// borrowed, before the poll sleep.  The caller uses it to feed the
    /// watchdog and to forward lines that expect no reply.
    ///
    /// Transport failures while reading are reported and polling
    /// continues; only a failed send aborts the exchange.
    pub fn run<T, C, S, H>(
        &self,
        channel: &mut LineChannel<T>,
        clock: &C,
        sink: &mut S,
        mut between_polls: H,
    ) -> Result<ExchangeOutcome, LinkError>
    where
        T: ByteChannel,
        C: ClockPort,
        S: EventSink,
        H: FnMut(&mut LineChannel<T>, &mut S),
    {
        if let Err(e) = channel.drain() {
            sink.emit(&LinkEvent::TransportFailed(e));
        }
        channel.write_line(self.request)?;

        let sent_at = clock.now_ms();
        let timeout = u64::from(self.timing.timeout_ms);
        let mut stray = 0u32;

        loop {
            let elapsed = clock.now_ms().saturating_sub(sent_at);
            if elapsed >= timeout {
                return Ok(self.timed_out(sink, elapsed, stray));
            }
            let budget = u32::try_from(timeout - elapsed)
                .unwrap_or(u32::MAX)
                .min(self.timing.read_timeout_ms);

            match channel.read_line(clock, budget) {
                Ok(Some(line)) if line.as_str() == self.expected => {
                    let rtt_ms = clock.now_ms().saturating_sub(sent_at);
                    if rtt_ms > timeout {
                        return Ok(self.timed_out(sink, rtt_ms, stray));
                    }
                    sink.emit(&LinkEvent::ExchangeSucceeded {
                        request: self.request,
                        rtt_ms,
                    });
                    return Ok(ExchangeOutcome::Replied { rtt_ms });
                }
                Ok(Some(line)) => {
                    stray = stray.saturating_add(1);
                    sink.emit(&LinkEvent::StrayLine(line.as_str()));
                    // More lines may already be buffered; read them before sleeping.
                    continue;
                }
                Ok(None) => {}
                Err(e) => sink.emit(&LinkEvent::TransportFailed(e)),
            }

            between_polls(channel, sink);
            clock.sleep_ms(self.timing.poll_interval_ms);
        }
    }

    fn timed_out<S: EventSink>(&self, sink: &mut S, waited_ms: u64, stray: u32) -> ExchangeOutcome {
        sink.emit(&LinkEvent::ExchangeTimedOut {
            request: self.request,
            expected: self.expected,
            waited_ms,
        });
        ExchangeOutcome::TimedOut { waited_ms, stray }
    }
}
