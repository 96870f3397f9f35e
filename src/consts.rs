//! Constants used across the YMODEM receiver and the image loader.
//!
//! This module defines the YMODEM control bytes, packet framing sizes,
//! timing and retry limits, and the layout constants of the legacy
//! boot-image (uImage) header.
//!
//! ## Key Concepts
//!
//! - **Control bytes**: single-byte tags exchanged on the wire to frame packets
//!   and drive flow control (`ACK`/`NAK`/`CAN`).
//! - **Packets**: `[tag][seq][!seq][payload][crc_hi][crc_lo]` with a payload of
//!   either 128 or 1024 bytes.
//! - **Cancel tolerance**: how many consecutive `CAN` bytes are swallowed before
//!   the sender is considered to have aborted.
//! - **Ring buffer**: software receive buffer decoupling the few-byte hardware
//!   FIFO from protocol processing.

/// Start of a packet carrying a 128-byte payload.
pub const SOH: u8 = 0x01;

/// Start of a packet carrying a 1024-byte payload.
pub const STX: u8 = 0x02;

/// End of transfer. Sent by the sender on its own, no packet body follows.
pub const EOT: u8 = 0x04;

/// Positive acknowledge.
pub const ACK: u8 = 0x06;

/// Backspace, sent after the cancel bytes to wipe them from a terminal.
pub const BS: u8 = 0x08;

/// Negative acknowledge, asks the sender to retransmit.
pub const NAK: u8 = 0x15;

/// Cancel. Either side sends it to abort the transfer.
pub const CAN: u8 = 0x18;

/// CRC request. Tells the sender to use CRC16 framing and to start sending.
pub const CRC_REQUEST: u8 = b'C';

/// Payload length of an `SOH` packet.
pub const SHORT_PAYLOAD_LEN: usize = 128;

/// Payload length of an `STX` packet.
pub const LONG_PAYLOAD_LEN: usize = 1024;

/// Bytes preceding the payload: tag, sequence, complement.
pub const PACKET_HEADER_LEN: usize = 3;

/// Bytes following the payload: CRC high, CRC low.
pub const PACKET_TRAILER_LEN: usize = 2;

/// Framing overhead of a packet.
pub const PACKET_OVERHEAD: usize = PACKET_HEADER_LEN + PACKET_TRAILER_LEN;

/// Size of the buffer able to hold the largest framed packet.
pub const PACKET_BUF_LEN: usize = LONG_PAYLOAD_LEN + PACKET_OVERHEAD;

/// How long a single byte read may wait, in microseconds.
pub const READ_TIMEOUT_US: u32 = 500_000;

/// Consecutive `CAN` bytes ignored while waiting for the header packet.
pub const HANDSHAKE_CANCEL_TOLERANCE: u8 = 3;

/// Consecutive `CAN` bytes ignored once the transfer is running.
pub const TRANSFER_CANCEL_TOLERANCE: u8 = 0;

/// How many `CAN` (and then `BS`) bytes the abort procedure sends.
pub const ABORT_REPEAT: usize = 4;

/// Capacity of the software receive ring buffer.
pub const RX_BUFFER_LEN: usize = 4096;

/// Magic number opening every legacy uImage header.
pub const UIMAGE_MAGIC: u32 = 0x2705_1956;

/// Length of the legacy uImage header. The payload starts right after it.
pub const IMAGE_HEADER_LEN: usize = 64;

/// Length of the NUL-padded image name field.
pub const IMAGE_NAME_LEN: usize = 32;
