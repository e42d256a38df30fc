//! Byte channel abstraction for the board-to-board link.
//!
//! Concrete implementations:
//! - ESP-IDF UART driver ([`UartChannel`](crate::adapters::uart::UartChannel))
//! - in-memory wire for host simulation ([`WireEnd`](crate::adapters::loopback::WireEnd))
//!
//! The line channel is generic over `ByteChannel`, so the exchange and
//! dispatch logic never see the peripheral.

/// Byte-oriented full-duplex channel with bounded reads.
pub trait ByteChannel {
    /// Error type for this channel.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`, waiting at most
    /// `timeout_ms` for data to arrive.
    ///
    /// Returns the number of bytes read; `Ok(0)` means the wait elapsed
    /// with nothing received.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Block until queued output has left the transmitter.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Discard everything received but not yet read.
    fn clear_input(&mut self) -> Result<(), Self::Error>;
}

/// A channel that discards all writes and never receives.
pub struct NullChannel;

impl ByteChannel for NullChannel {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        (**self).read(buf, timeout_ms)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        (**self).clear_input()
    }
}
