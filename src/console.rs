//! Human-readable diagnostics over the serial link.
//!
//! The serial port is the only output a bootloading board has, so progress
//! and error reports are written straight into it. [`Console`] adapts any
//! [`Hal`] to [`core::fmt::Write`] and turns `\n` into `\r\n` for terminals.

use core::fmt;

use crate::hal::Hal;

/// Text writer on top of a [`Hal`].
///
/// ```rust,ignore
/// use core::fmt::Write;
///
/// let _ = writeln!(Console::new(&mut hal), "jumping to {:#010x}...", entry);
/// ```
#[derive(Debug)]
pub struct Console<'a, H: Hal> {
    hal: &'a mut H,
}

impl<'a, H: Hal> Console<'a, H> {
    /// Borrows `hal` for writing text.
    pub fn new(hal: &'a mut H) -> Self {
        Self { hal }
    }
}

impl<H: Hal> fmt::Write for Console<'_, H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.hal.write_byte(b'\r');
            }
            self.hal.write_byte(byte);
        }
        Ok(())
    }
}
