//! In-memory serial wire for host simulation.
//!
//! [`wire`] returns two connected ends; bytes written on one become
//! readable on the other.  Reads block on a condition variable up to the
//! requested timeout, so the link tasks run against it in real time exactly
//! as they would against the UART driver.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::link::transport::ByteChannel;

/// One direction of the wire.
#[derive(Default)]
struct Pipe {
    bytes: Mutex<VecDeque<u8>>,
    ready: Condvar,
}

/// The wire's lock was poisoned by a panicking peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireError;

/// One end of an in-memory serial wire.
#[derive(Clone)]
pub struct WireEnd {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
}

/// A connected pair of wire ends.
pub fn wire() -> (WireEnd, WireEnd) {
    let a_to_b = Arc::new(Pipe::default());
    let b_to_a = Arc::new(Pipe::default());
    (
        WireEnd {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        },
        WireEnd {
            rx: a_to_b,
            tx: b_to_a,
        },
    )
}

impl WireEnd {
    /// Bytes waiting to be read on this end.
    pub fn available(&self) -> usize {
        self.rx.bytes.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl ByteChannel for WireEnd {
    type Error = WireError;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, WireError> {
        let guard = self.rx.bytes.lock().map_err(|_| WireError)?;
        let (mut queue, _) = self
            .rx
            .ready
            .wait_timeout_while(guard, Duration::from_millis(u64::from(timeout_ms)), |q| {
                q.is_empty()
            })
            .map_err(|_| WireError)?;

        let n = queue.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WireError> {
        let mut queue = self.tx.bytes.lock().map_err(|_| WireError)?;
        queue.extend(data.iter().copied());
        self.tx.ready.notify_all();
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), WireError> {
        self.rx.bytes.lock().map_err(|_| WireError)?.clear();
        Ok(())
    }
}
