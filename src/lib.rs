//! # ymodem-boot
//!
//! A portable, no_std core for serial bootloaders: it asks a host for a firmware
//! image over YMODEM, checks the legacy uImage header in front of it, moves the
//! payload to its load address and jumps to its entry point.
//!
//! The crate is built for boards that have nothing but a serial console:
//! - polled I/O only, no interrupts and no heap
//! - every byte read carries its own 500 ms deadline on a wrapping counter
//! - protocol failures are recovered by restarting the whole download
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` support |
//! | `defmt-0-3` | Uses `defmt` logging |
//! | `log`       | Uses `log` logging |
//!
//! ## Layout
//!
//! - [`crc`]: CRC16 (XMODEM flavour) used for packet integrity
//! - [`packet`]: reads and checks a single YMODEM packet
//! - [`session`]: the handshake / data / termination exchange
//! - [`image`] and [`loader`]: uImage header checks, relocation, entry
//! - [`hal`]: the platform contract and a polled UART implementation of it
//! - [`boot`]: the top-level download-and-boot loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ymodem_boot::{boot, hal::uart::PolledUart, loader::BareMetal};
//!
//! let mut hal = PolledUart::new(dbgu, pit, rstc);
//! let download = unsafe { core::slice::from_raw_parts_mut(DOWNLOAD_ADDR, DOWNLOAD_LEN) };
//! boot::run(&mut hal, &mut BareMetal, download);
//! ```
//!
//! --
//! Designed for `#![no_std]` use on boards whose only boot medium is a UART.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod boot;
pub mod console;
pub mod consts;
pub mod crc;
pub mod hal;
pub mod image;
pub mod loader;
pub mod packet;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "defmt-0-3")]
pub(crate) use defmt as logging;

#[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
pub(crate) use log as logging;

#[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
pub(crate) mod logging {
    macro_rules! debug {
        ( $( $x:expr ),* $(,)? ) => {{
            $( let _ = &$x; )*
        }};
    }
    pub(crate) use debug;
    macro_rules! info {
        ( $( $x:expr ),* $(,)? ) => {{
            $( let _ = &$x; )*
        }};
    }
    pub(crate) use info;
    macro_rules! warner {
        ( $( $x:expr ),* $(,)? ) => {{
            $( let _ = &$x; )*
        }};
    }
    pub(crate) use warner as warn;
}
