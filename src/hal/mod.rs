//! Hardware abstraction used by the protocol engine.
//!
//! The receiver only needs five things from a platform: one-time setup, a byte
//! read that gives up after a deadline, a byte write, a way to throw away
//! pending input, and a full chip reset. These are collected in [`Hal`].
//!
//! Most chips get there the same way: a UART with a few bytes of receive FIFO,
//! polled without interrupts, plus a free-running counter for deadlines. That
//! shared part lives in [`uart::PolledUart`], which only asks the platform for
//! a serial port (`embedded-hal-nb`), a [`Clock`] and a [`ResetControl`].
//!
//! | Seam             | Provided by            |
//! |------------------|------------------------|
//! | serial port      | chip HAL crate         |
//! | [`Clock`]        | chip timer/counter     |
//! | [`ResetControl`] | chip reset controller  |

pub mod uart;

/// Byte I/O, timing and reset primitives of one platform.
///
/// Exactly one instance exists; it is built at startup and handed by
/// reference to the session and packet receiver.
pub trait Hal {
    /// One-time platform setup (clocks, counters). Called once before any I/O.
    fn init(&mut self);

    /// Returns the next received byte, or `None` if nothing arrived within
    /// `timeout_us` microseconds.
    fn read_byte(&mut self, timeout_us: u32) -> Option<u8>;

    /// Sends one byte, blocking until the transmitter accepts it. Incoming
    /// bytes keep being collected while waiting.
    fn write_byte(&mut self, byte: u8);

    /// Drops everything received so far, in hardware and in software.
    fn discard_input(&mut self);

    /// Resets the whole chip.
    fn reset(&mut self) -> !;
}

/// A free-running hardware counter.
pub trait Clock {
    /// Starts the counter. The default does nothing.
    fn start(&mut self) {}

    /// Current counter value. Wraps around freely.
    fn now(&mut self) -> u32;

    /// Converts a duration in microseconds into counter ticks.
    fn ticks_from_us(&self, us: u32) -> u32;
}

/// Full chip reset.
pub trait ResetControl {
    /// Triggers the reset and never returns.
    fn reset(&mut self) -> !;
}

/// A point in time on a wrapping [`Clock`].
///
/// Comparison uses the signed distance to the deadline, so it stays correct
/// when the counter wraps between start and expiry.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Deadline {
    at: u32,
}

impl Deadline {
    /// A deadline `ticks` counter ticks after `now`.
    pub fn after(now: u32, ticks: u32) -> Self {
        Self {
            at: now.wrapping_add(ticks),
        }
    }

    /// Whether the deadline has been reached at counter value `now`.
    pub fn expired(&self, now: u32) -> bool {
        (self.at.wrapping_sub(now) as i32) <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expires_at_target() {
        let deadline = Deadline::after(100, 50);
        assert!(!deadline.expired(100));
        assert!(!deadline.expired(149));
        assert!(deadline.expired(150));
        assert!(deadline.expired(1_000));
    }

    #[test]
    fn test_deadline_survives_counter_wrap() {
        let deadline = Deadline::after(u32::MAX - 10, 20);
        assert!(!deadline.expired(u32::MAX - 10));
        assert!(!deadline.expired(u32::MAX));
        assert!(!deadline.expired(0));
        assert!(!deadline.expired(8));
        assert!(deadline.expired(9));
        assert!(deadline.expired(10));
    }

    #[test]
    fn test_zero_length_deadline_is_already_expired() {
        assert!(Deadline::after(7, 0).expired(7));
    }
}
