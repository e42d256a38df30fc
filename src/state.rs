//! Process-wide shared state.
//!
//! The two tasks on each board share exactly two things: the connectivity
//! flag and the physical output pin.  Both are single-writer; readers
//! tolerate a value that is one scheduling tick stale, so relaxed atomics
//! are sufficient and no lock is taken.
//!
//! ```text
//! ┌──────────────┐  ConnectivityFlag  ┌──────────────┐
//! │  WiFi task   │──────────────────▶│  Status task │
//! │  (writer)    │    AtomicBool      │  (reader)    │
//! └──────────────┘                    └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ── Output level ─────────────────────────────────────────────

/// Logic level of a digital output.  Boots [`Level::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Self::High
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

// ── Connectivity flag ────────────────────────────────────────

/// "Network link established", published by the Wi-Fi adapter.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityFlag(Arc<AtomicBool>);

impl ConnectivityFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ── Cancellation ─────────────────────────────────────────────

/// Stop signal observed by every task loop once per iteration.
///
/// The firmware runs with [`CancelToken::never`]: nothing ever calls
/// [`cancel`](Self::cancel), so the loops run until power-down.  Host
/// tests and simulations cancel explicitly to end a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
