//! The YMODEM receive session.
//!
//! One call to [`ymodem_receive`] runs one single-file batch through three
//! phases, never going back to an earlier one:
//!
//! 1. **Handshake**: ask for CRC mode with `C` until the sender answers with
//!    block 0, which carries the file name and its decimal size.
//! 2. **Data**: accept blocks 1, 2, ... (wrapping at 256) into the
//!    destination buffer until `EOT`.
//! 3. **Termination**: accept the empty block 0 that closes the batch.
//!
//! Anything that leaves the sender in an unknown state (a malformed packet, a
//! dead link mid-transfer, a size mismatch) runs the abort procedure: four
//! `CAN`, four `BS`, and a drain of pending input. The caller is expected to
//! start over with a fresh call.

use thiserror::Error;

use crate::consts::{
    ABORT_REPEAT, ACK, BS, CAN, CRC_REQUEST, HANDSHAKE_CANCEL_TOLERANCE, NAK,
    TRANSFER_CANCEL_TOLERANCE,
};
use crate::hal::Hal;
use crate::logging;
use crate::packet::{Outcome, PacketReceiver};

/// Why a transfer failed.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TransferError {
    /// The sender cancelled.
    #[error("transfer cancelled by sender")]
    Cancelled,
    /// A packet failed its sequence or CRC check, or started with an unknown byte.
    #[error("malformed packet")]
    Protocol,
    /// The sender went quiet mid-transfer.
    #[error("timed out waiting for sender")]
    Timeout,
    /// The header packet carried no usable file size.
    #[error("header packet carries no file size")]
    BadHeader,
    /// The sender announced an empty batch.
    #[error("sender has no file to send")]
    EmptyBatch,
    /// The announced file does not fit into the destination buffer.
    #[error("file of {declared:#010x} bytes does not fit in {capacity:#010x} bytes")]
    TooLarge {
        /// Size from the header packet.
        declared: usize,
        /// Length of the destination buffer.
        capacity: usize,
    },
    /// A data packet arrived after the whole file had been received.
    #[error("Received too much data, expected {expected:#010x} bytes")]
    Overrun {
        /// Size from the header packet.
        expected: usize,
    },
    /// `EOT` arrived before the whole file had been received.
    #[error("Received {received:#010x} bytes (expected: {expected:#010x} bytes)")]
    Short {
        /// Bytes stored before `EOT`.
        received: usize,
        /// Size from the header packet.
        expected: usize,
    },
    /// A second `EOT` arrived where the closing header was expected.
    #[error("expected final packet, received EOF")]
    UnexpectedEndOfTransfer,
    /// Something other than the empty closing header arrived after `EOT`.
    #[error("expected final packet, received another file")]
    UnexpectedPacket,
}

/// Receives one file over YMODEM into `dest`.
///
/// # Returns
/// - `Ok(len)`: the file size announced in the header; `dest[..len]` holds the file
/// - `Err(_)`: the transfer failed and the sender has been told so where needed
///
/// # Example
///
/// ```rust,ignore
/// let size = loop {
///     match ymodem_receive(&mut hal, download) {
///         Ok(size) => break size,
///         Err(_) => continue,
///     }
/// };
/// ```
pub fn ymodem_receive<H: Hal>(hal: &mut H, dest: &mut [u8]) -> Result<usize, TransferError> {
    let mut session = Session::new(hal, dest);
    session.handshake()?;
    session.receive_data()?;
    session.terminate()
}

/// State of one transfer. Lives for the duration of [`ymodem_receive`].
#[derive(Debug)]
pub struct Session<'a, H: Hal> {
    hal: &'a mut H,
    dest: &'a mut [u8],
    receiver: PacketReceiver,
    /// Next block number expected, wraps at 256.
    expected: u8,
    /// Bytes stored into `dest` so far.
    received: usize,
    /// File size announced by the header packet.
    total: usize,
}

impl<'a, H: Hal> Session<'a, H> {
    /// Starts a session writing into `dest`.
    pub fn new(hal: &'a mut H, dest: &'a mut [u8]) -> Self {
        Self {
            hal,
            dest,
            receiver: PacketReceiver::new(),
            expected: 1,
            received: 0,
            total: 0,
        }
    }

    /// Phase A: waits for block 0 and reads the file size from it.
    pub fn handshake(&mut self) -> Result<(), TransferError> {
        loop {
            self.hal.discard_input();
            self.hal.write_byte(CRC_REQUEST);
            match self.receiver.receive(&mut *self.hal, HANDSHAKE_CANCEL_TOLERANCE) {
                Outcome::Packet(packet) if packet.sequence != 0 => {
                    logging::debug!("handshake: got block {}, want 0", packet.sequence);
                    self.hal.write_byte(NAK);
                }
                Outcome::Packet(packet) => {
                    let empty = header_is_empty(packet.payload);
                    let size = parse_file_size(packet.payload);
                    if empty {
                        self.hal.write_byte(ACK);
                        return Err(TransferError::EmptyBatch);
                    }
                    let Some(total) = size else {
                        return Err(self.abort(TransferError::BadHeader));
                    };
                    if total > self.dest.len() {
                        return Err(self.abort(TransferError::TooLarge {
                            declared: total,
                            capacity: self.dest.len(),
                        }));
                    }
                    self.total = total;
                    self.hal.write_byte(ACK);
                    self.hal.write_byte(CRC_REQUEST);
                    logging::info!("handshake done, expecting {} bytes", total);
                    return Ok(());
                }
                Outcome::EndOfTransfer => self.hal.write_byte(NAK),
                Outcome::ProtocolError => return Err(self.abort(TransferError::Protocol)),
                Outcome::Abort => {
                    self.hal.write_byte(ACK);
                    return Err(TransferError::Cancelled);
                }
                Outcome::Timeout => {}
            }
        }
    }

    /// Phase B: stores data blocks until `EOT`.
    pub fn receive_data(&mut self) -> Result<(), TransferError> {
        loop {
            match self.receiver.receive(&mut *self.hal, TRANSFER_CANCEL_TOLERANCE) {
                Outcome::EndOfTransfer => {
                    self.hal.write_byte(ACK);
                    self.hal.write_byte(CRC_REQUEST);
                    if self.received < self.total {
                        let err = TransferError::Short {
                            received: self.received,
                            expected: self.total,
                        };
                        return Err(self.abort(err));
                    }
                    return Ok(());
                }
                Outcome::Packet(packet) if packet.sequence != self.expected => {
                    logging::debug!(
                        "got block {}, want {}, NAK",
                        packet.sequence,
                        self.expected
                    );
                    self.hal.write_byte(NAK);
                    self.hal.discard_input();
                }
                Outcome::Packet(packet) => {
                    let remaining = self.total - self.received;
                    if remaining == 0 {
                        let err = TransferError::Overrun {
                            expected: self.total,
                        };
                        return Err(self.abort(err));
                    }
                    self.hal.write_byte(ACK);
                    self.expected = self.expected.wrapping_add(1);
                    // The last block is padded; only the announced bytes are kept.
                    let len = packet.payload.len().min(remaining);
                    self.dest[self.received..self.received + len]
                        .copy_from_slice(&packet.payload[..len]);
                    self.received += len;
                }
                Outcome::ProtocolError => return Err(self.abort(TransferError::Protocol)),
                Outcome::Abort => return Err(TransferError::Cancelled),
                Outcome::Timeout => return Err(self.abort(TransferError::Timeout)),
            }
        }
    }

    /// Phase C: accepts the empty block 0 closing the batch.
    pub fn terminate(&mut self) -> Result<usize, TransferError> {
        match self.receiver.receive(&mut *self.hal, TRANSFER_CANCEL_TOLERANCE) {
            Outcome::Packet(packet) if packet.sequence == 0 && header_is_empty(packet.payload) => {
                self.hal.write_byte(ACK);
                Ok(self.total)
            }
            Outcome::Packet(_) => Err(self.abort(TransferError::UnexpectedPacket)),
            Outcome::EndOfTransfer => Err(TransferError::UnexpectedEndOfTransfer),
            Outcome::ProtocolError => Err(self.abort(TransferError::Protocol)),
            Outcome::Abort => Err(TransferError::Cancelled),
            Outcome::Timeout => Err(self.abort(TransferError::Timeout)),
        }
    }

    /// Cancels the transfer on the wire and hands `err` back.
    fn abort(&mut self, err: TransferError) -> TransferError {
        logging::warn!("aborting transfer: {}", err);
        abort_transfer(&mut *self.hal);
        err
    }
}

/// Sends the cancel sequence and drops whatever the sender still had in flight.
pub fn abort_transfer<H: Hal>(hal: &mut H) {
    for _ in 0..ABORT_REPEAT {
        hal.write_byte(CAN);
    }
    for _ in 0..ABORT_REPEAT {
        hal.write_byte(BS);
    }
    hal.discard_input();
}

/// Whether a block-0 payload is the empty header closing a batch.
pub fn header_is_empty(payload: &[u8]) -> bool {
    payload.first().is_none_or(|&b| b == 0)
}

/// Reads the file size from a block-0 payload.
///
/// The payload is `name\0size[ mtime mode ...]`. The size is the run of ASCII
/// digits right after the name's NUL and ends at the first non-digit.
///
/// ```rust
/// use ymodem_boot::session::parse_file_size;
///
/// assert_eq!(parse_file_size(b"firmware.bin\x00204800 "), Some(204800));
/// assert_eq!(parse_file_size(b"firmware.bin\x00 "), None);
/// ```
pub fn parse_file_size(payload: &[u8]) -> Option<usize> {
    let name_end = payload.iter().position(|&b| b == 0)?;
    let digits = payload[name_end + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit());
    let mut size: Option<usize> = None;
    for &digit in digits {
        let value = size.unwrap_or(0);
        size = Some(value.checked_mul(10)?.checked_add(usize::from(digit - b'0'))?);
    }
    size
}
