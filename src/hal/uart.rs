//! Polled UART shared by every platform.
//!
//! The hardware receive FIFO is only a few bytes deep and there are no
//! interrupts, so every busy-wait in here keeps moving bytes from the FIFO
//! into a 4096-byte software ring buffer. When the ring is full new bytes are
//! dropped; the YMODEM retry rules recover from the loss.

use embedded_hal_nb::serial::{Read, Write};
use heapless::Deque;
use nb::block;

use crate::consts::RX_BUFFER_LEN;
use crate::hal::{Clock, Deadline, Hal, ResetControl};
use crate::logging;

/// [`Hal`] implementation over a polled serial port.
///
/// ## Type Parameters
///
/// - `U`: serial port implementing the `embedded-hal-nb` [`Read`] and [`Write`] traits
/// - `C`: free-running [`Clock`] used for read deadlines
/// - `R`: chip [`ResetControl`]
///
/// ## Example
///
/// ```rust,ignore
/// use ymodem_boot::hal::uart::PolledUart;
///
/// let mut hal = PolledUart::new(dbgu, pit, rstc);
/// hal.init();
/// ```
#[derive(Debug)]
pub struct PolledUart<U, C, R> {
    uart: U,
    clock: C,
    reset: R,
    rx: Deque<u8, RX_BUFFER_LEN>,
}

impl<U, C, R> PolledUart<U, C, R>
where
    U: Read<u8> + Write<u8>,
    C: Clock,
    R: ResetControl,
{
    /// Wraps a serial port, a counter and a reset controller.
    pub fn new(uart: U, clock: C, reset: R) -> Self {
        Self {
            uart,
            clock,
            reset,
            rx: Deque::new(),
        }
    }

    /// Moves at most one byte from the hardware FIFO into the ring buffer.
    ///
    /// With a full ring the byte stays in the FIFO, where the hardware drops
    /// whatever overflows.
    fn service_rx(&mut self) {
        if self.rx.is_full() {
            logging::debug!("rx ring full, leaving bytes in the fifo");
            return;
        }
        match self.uart.read() {
            Ok(byte) => {
                // Room was checked above.
                let _ = self.rx.push_back(byte);
            }
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(_)) => logging::warn!("uart receive error"),
        }
    }
}

impl<U, C, R> Hal for PolledUart<U, C, R>
where
    U: Read<u8> + Write<u8>,
    C: Clock,
    R: ResetControl,
{
    fn init(&mut self) {
        self.clock.start();
    }

    fn read_byte(&mut self, timeout_us: u32) -> Option<u8> {
        let ticks = self.clock.ticks_from_us(timeout_us);
        let deadline = Deadline::after(self.clock.now(), ticks);
        while self.rx.is_empty() && !deadline.expired(self.clock.now()) {
            self.service_rx();
        }
        self.rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.service_rx();
        loop {
            match self.uart.write(byte) {
                Ok(()) => return,
                Err(nb::Error::WouldBlock) => self.service_rx(),
                Err(nb::Error::Other(_)) => {
                    logging::warn!("uart transmit error");
                    return;
                }
            }
        }
    }

    fn discard_input(&mut self) {
        loop {
            match self.uart.read() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => break,
                // A sticky error flag would otherwise keep this loop alive.
                Err(nb::Error::Other(_)) => {
                    logging::warn!("uart receive error while discarding input");
                    break;
                }
            }
        }
        self.rx.clear();
    }

    fn reset(&mut self) -> ! {
        // Let pending diagnostics leave the transmitter first.
        if block!(self.uart.flush()).is_err() {
            logging::warn!("uart flush failed before reset");
        }
        self.reset.reset()
    }
}
