//! Top-level bootloader flow.
//!
//! [`run`] is what a board's reset handler calls once its [`Hal`] is built:
//! greet on the console, download until a transfer succeeds, then hand the
//! result to the [`loader`](crate::loader). It never returns.

use core::fmt::Write;

use crate::console::Console;
use crate::hal::Hal;
use crate::loader::{Target, boot_image};
use crate::logging;
use crate::session::ymodem_receive;

/// Downloads an image into `download` and boots it.
///
/// Failed transfers are reported and retried forever. Once an image has
/// been received, the outcome is either a jump into it or a chip reset.
///
/// # Arguments
/// - `hal`: the platform, not yet initialized
/// - `target`: where validated images are relocated and entered
/// - `download`: scratch memory receiving the whole file, header included
pub fn run<H: Hal, T: Target>(hal: &mut H, target: &mut T, download: &mut [u8]) -> ! {
    hal.init();

    let _ = write!(
        Console::new(&mut *hal),
        " ymodem bootloader\n===================\ndownloading uImage to {:#010x}...\n",
        download.as_ptr() as usize
    );

    let mut attempt: u32 = 0;
    let size = loop {
        attempt = attempt.wrapping_add(1);
        match ymodem_receive(&mut *hal, download) {
            Ok(size) => break size,
            Err(err) => {
                logging::warn!("download attempt {} failed: {}", attempt, err);
                let _ = write!(
                    Console::new(&mut *hal),
                    "error: {err}\ndownload failed, retrying...\n"
                );
            }
        }
    };

    logging::info!("download complete after {} attempts", attempt);
    let _ = writeln!(
        Console::new(&mut *hal),
        "download complete, {size:#010x} bytes received."
    );
    boot_image(hal, target, download, size)
}
