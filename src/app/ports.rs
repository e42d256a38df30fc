//! Port traits: the hexagonal boundary between the link logic and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ task loops (domain)
//! ```
//!
//! Driven adapters (GPIO, clock, watchdog, event sinks) implement these
//! traits.  The task loops in [`initiator`](super::initiator),
//! [`responder`](super::responder) and [`heartbeat`](super::heartbeat)
//! consume them via generics, so the loops never touch hardware directly
//! and run unchanged on the host under test.

use crate::state::Level;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// A single digital output.
pub trait OutputPort {
    /// Drive the output.  Failures are logged by the adapter, never
    /// propagated: a stuck pin must not stop the loop.
    fn set_level(&mut self, level: Level);

    /// Last level written.
    fn level(&self) -> Level;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → RTOS timer / scheduler)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus the cooperative yield.
///
/// Every timeout in the firmware is computed by comparing [`now_ms`]
/// readings; no in-flight read is ever interrupted.
///
/// [`now_ms`]: ClockPort::now_ms
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms`, letting other tasks run.
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Per-task watchdog subscription.  Loops call [`feed`](Self::feed) once
/// per iteration and once per poll while waiting for a reply.
pub trait WatchdogPort {
    fn feed(&self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The loops emit structured [`LinkEvent`](super::events::LinkEvent)s
/// through this port.  Adapters decide where they go (serial log today).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LinkEvent<'_>);
}

impl<C: ClockPort + ?Sized> ClockPort for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: u32) {
        (**self).sleep_ms(ms);
    }
}

impl<W: WatchdogPort + ?Sized> WatchdogPort for &W {
    fn feed(&self) {
        (**self).feed();
    }
}
