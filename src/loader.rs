//! Relocating and starting a downloaded image.
//!
//! [`boot_image`] checks the header, copies the payload to the header's load
//! address and calls the entry point. Every failure ends in a chip reset:
//! once the download is done there is nothing left to retry with.
//!
//! Touching raw addresses is confined to [`BareMetal`], the only [`Target`]
//! meant for real hardware, and to [`move_bytes`]. The payload reaches a
//! [`Target`] as a raw pointer because the load address may fall inside the
//! download buffer it is read from.

use core::fmt::Write;

use crate::console::Console;
use crate::consts::IMAGE_HEADER_LEN;
use crate::hal::Hal;
use crate::image::ImageHeader;
use crate::logging;

/// Where a validated image goes.
pub trait Target {
    /// Copies `len` bytes starting at `src` to `load_address`. The
    /// destination may overlap the source.
    ///
    /// # Safety
    /// `src` must be valid for `len` reads and no reference to that memory may
    /// be used while the call runs.
    unsafe fn relocate(&mut self, load_address: u32, src: *const u8, len: usize);

    /// Transfers control to `entry_point`. Only returns if the image does.
    fn enter(&mut self, entry_point: u32);
}

/// The physical address space of the running chip.
#[derive(Debug, Default, Clone, Copy)]
pub struct BareMetal;

impl Target for BareMetal {
    unsafe fn relocate(&mut self, load_address: u32, src: *const u8, len: usize) {
        let dest = load_address as usize as *mut u8;
        // SAFETY: the header names the load address and the bootloader owns
        // all of RAM at this point. `src` is valid per the caller.
        unsafe { move_bytes(dest, src, len) }
    }

    fn enter(&mut self, entry_point: u32) {
        // SAFETY: the image was copied to its load address and its header
        // names this address as the start of its code.
        let entry: extern "C" fn() = unsafe { core::mem::transmute(entry_point as usize) };
        entry();
    }
}

/// Copies `len` bytes from `src` to `dest`, correct for overlapping ranges.
///
/// Copies front to back when `dest` lies below `src`, back to front otherwise.
///
/// # Safety
/// `src` must be valid for `len` reads and `dest` for `len` writes.
pub unsafe fn move_bytes(dest: *mut u8, src: *const u8, len: usize) {
    if (dest as usize) < (src as usize) {
        for i in 0..len {
            // SAFETY: `i < len`, both ranges are valid per the caller.
            unsafe { *dest.add(i) = *src.add(i) };
        }
    } else {
        for i in (0..len).rev() {
            // SAFETY: as above.
            unsafe { *dest.add(i) = *src.add(i) };
        }
    }
}

/// Boots the image at the start of `region`, of which `received` bytes were
/// downloaded.
///
/// Prints progress and errors through the [`Hal`], relocates the payload and
/// enters it. Resets the chip if validation fails or the image returns.
///
/// The load address may lie inside `region` itself, which is why it is
/// borrowed mutably.
pub fn boot_image<H: Hal, T: Target>(
    hal: &mut H,
    target: &mut T,
    region: &mut [u8],
    received: usize,
) -> ! {
    // Never trust a length beyond the region itself.
    let received = received.min(region.len());
    let header = match ImageHeader::parse(region).and_then(|h| h.validate(received).map(|()| h)) {
        Ok(header) => header,
        Err(err) => {
            logging::warn!("image rejected: {}", err);
            let _ = writeln!(Console::new(&mut *hal), "error: {err}");
            hal.reset()
        }
    };

    let len = header.payload_len();
    // Derived from the whole region so a target may write anywhere in it.
    let source = region.as_mut_ptr().wrapping_add(IMAGE_HEADER_LEN);
    if let Some(name) = header.name() {
        let _ = writeln!(Console::new(&mut *hal), "image: {name}");
    }
    // SAFETY: validation put `len` payload bytes inside `region`, and nothing
    // else touches `region` until the move is done.
    unsafe { target.relocate(header.load_address, source, len) };
    logging::info!(
        "relocated {} bytes to {}, entry {}",
        len,
        header.load_address,
        header.entry_point
    );
    let _ = writeln!(
        Console::new(&mut *hal),
        "relocated file from {:#010x} to {:#010x}\njumping to {:#010x}...",
        source as usize,
        header.load_address,
        header.entry_point
    );
    target.enter(header.entry_point);
    hal.reset()
}
