//! Reception of a single YMODEM packet.
//!
//! A packet on the wire looks like
//!
//! ```text
//! [SOH|STX][seq][!seq][payload: 128 | 1024 bytes][crc_hi][crc_lo]
//! ```
//!
//! or is a lone `EOT` byte. [`PacketReceiver::receive`] reads one of these
//! from the [`Hal`], checks the sequence complement and the CRC, and sorts the
//! result into an [`Outcome`]. It never answers the sender; what to send back
//! is up to the [`session`](crate::session).

use crate::consts::{
    CAN, EOT, LONG_PAYLOAD_LEN, PACKET_BUF_LEN, PACKET_TRAILER_LEN, READ_TIMEOUT_US,
    SHORT_PAYLOAD_LEN, SOH, STX,
};
use crate::crc::crc16;
use crate::hal::Hal;

/// A received packet that passed both integrity checks.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Packet<'a> {
    /// Block number as sent, modulo 256.
    pub sequence: u8,
    /// The 128 or 1024 payload bytes, padding included.
    pub payload: &'a [u8],
}

/// Result of one [`PacketReceiver::receive`] call.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Outcome<'a> {
    /// A well-formed data or header packet.
    Packet(Packet<'a>),
    /// The sender sent `EOT`.
    EndOfTransfer,
    /// The sender cancelled: more `CAN` bytes arrived than tolerated.
    Abort,
    /// Unknown leading byte, broken sequence complement, or bad CRC.
    ProtocolError,
    /// A byte did not arrive in time. Partial packet data is discarded.
    Timeout,
}

/// Reads packets into a fixed buffer large enough for a 1024-byte packet.
#[derive(Debug)]
pub struct PacketReceiver {
    buf: [u8; PACKET_BUF_LEN],
}

impl Default for PacketReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketReceiver {
    /// Creates a receiver with a zeroed buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; PACKET_BUF_LEN],
        }
    }

    /// Reads and checks the next packet.
    ///
    /// # Arguments
    /// - `hal`: byte source; every read waits at most [`READ_TIMEOUT_US`]
    /// - `cancel_tolerance`: how many leading `CAN` bytes to skip before
    ///   reporting [`Outcome::Abort`]. With `0` the first `CAN` aborts.
    ///
    /// # Returns
    /// The classified [`Outcome`]. A returned [`Packet`] borrows this
    /// receiver's buffer until the next call.
    pub fn receive<H: Hal>(&mut self, hal: &mut H, cancel_tolerance: u8) -> Outcome<'_> {
        let mut tolerance = cancel_tolerance;
        let payload_len = loop {
            let Some(lead) = hal.read_byte(READ_TIMEOUT_US) else {
                return Outcome::Timeout;
            };
            match lead {
                SOH => break SHORT_PAYLOAD_LEN,
                STX => break LONG_PAYLOAD_LEN,
                EOT => return Outcome::EndOfTransfer,
                CAN if tolerance > 0 => tolerance -= 1,
                CAN => return Outcome::Abort,
                _ => return Outcome::ProtocolError,
            }
        };

        // seq, !seq, payload, crc
        let body = &mut self.buf[..2 + payload_len + PACKET_TRAILER_LEN];
        for slot in body.iter_mut() {
            match hal.read_byte(READ_TIMEOUT_US) {
                Some(byte) => *slot = byte,
                None => return Outcome::Timeout,
            }
        }

        let (sequence, complement) = (body[0], body[1]);
        if sequence != complement ^ 0xff {
            return Outcome::ProtocolError;
        }
        // The CRC covers the payload only; feeding it its own CRC yields zero.
        if crc16(&body[2..]) != 0 {
            return Outcome::ProtocolError;
        }
        Outcome::Packet(Packet {
            sequence,
            payload: &body[2..2 + payload_len],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ACK;
    use crate::testing::{Reply, ScriptedHal, frame, pattern};

    fn receive_from(bytes: Vec<u8>, cancel_tolerance: u8) -> (Outcome<'static>, ScriptedHal) {
        let mut hal = ScriptedHal::with_replies([Reply::Bytes(bytes)]);
        let receiver = Box::leak(Box::new(PacketReceiver::new()));
        let outcome = receiver.receive(&mut hal, cancel_tolerance);
        (outcome, hal)
    }

    #[test]
    fn test_short_packet() {
        let data = pattern(128, 3);
        let (outcome, _) = receive_from(frame(1, &data), 0);
        assert_eq!(
            outcome,
            Outcome::Packet(Packet {
                sequence: 1,
                payload: &data
            })
        );
    }

    #[test]
    fn test_long_packet() {
        let data = pattern(1024, 9);
        let (outcome, _) = receive_from(frame(0xfe, &data), 0);
        match outcome {
            Outcome::Packet(packet) => {
                assert_eq!(packet.sequence, 0xfe);
                assert_eq!(packet.payload.len(), 1024);
                assert_eq!(packet.payload, &data[..]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_end_of_transfer_has_no_body() {
        let (outcome, hal) = receive_from(vec![EOT, 0x42], 0);
        assert_eq!(outcome, Outcome::EndOfTransfer);
        assert!(hal.written.is_empty());
    }

    #[test]
    fn test_unknown_lead_byte_is_protocol_error() {
        let (outcome, _) = receive_from(vec![ACK], 0);
        assert_eq!(outcome, Outcome::ProtocolError);
        let (outcome, _) = receive_from(vec![b'x'], 3);
        assert_eq!(outcome, Outcome::ProtocolError);
    }

    #[test]
    fn test_cancel_without_tolerance_aborts() {
        let (outcome, _) = receive_from(vec![CAN], 0);
        assert_eq!(outcome, Outcome::Abort);
    }

    #[test]
    fn test_cancels_within_tolerance_are_skipped() {
        let mut bytes = vec![CAN, CAN, CAN];
        bytes.extend(frame(0, &[]));
        let (outcome, _) = receive_from(bytes, 3);
        assert!(matches!(outcome, Outcome::Packet(Packet { sequence: 0, .. })));
    }

    #[test]
    fn test_cancels_beyond_tolerance_abort() {
        let mut bytes = vec![CAN, CAN, CAN, CAN];
        bytes.extend(frame(0, &[]));
        let (outcome, _) = receive_from(bytes, 3);
        assert_eq!(outcome, Outcome::Abort);
    }

    #[test]
    fn test_broken_complement_is_protocol_error() {
        let mut bad_sequence = frame(5, &pattern(128, 1));
        bad_sequence[1] = 6;
        let (outcome, _) = receive_from(bad_sequence, 0);
        assert_eq!(outcome, Outcome::ProtocolError);

        let mut bad_complement = frame(5, &pattern(128, 1));
        bad_complement[2] = 0;
        let (outcome, _) = receive_from(bad_complement, 0);
        assert_eq!(outcome, Outcome::ProtocolError);
    }

    #[test]
    fn test_corrupted_payload_is_protocol_error() {
        let mut packet = frame(2, &pattern(1024, 4));
        packet[500] ^= 0x80;
        let (outcome, _) = receive_from(packet, 0);
        assert_eq!(outcome, Outcome::ProtocolError);
    }

    #[test]
    fn test_corrupted_crc_is_protocol_error() {
        let mut packet = frame(2, &pattern(128, 4));
        let last = packet.len() - 1;
        packet[last] ^= 0x01;
        let (outcome, _) = receive_from(packet, 0);
        assert_eq!(outcome, Outcome::ProtocolError);
    }

    #[test]
    fn test_silence_before_lead_byte_times_out() {
        let mut hal = ScriptedHal::with_replies([Reply::Silence]);
        let mut receiver = PacketReceiver::new();
        assert_eq!(receiver.receive(&mut hal, 3), Outcome::Timeout);
    }

    #[test]
    fn test_truncated_packet_times_out() {
        let packet = frame(1, &pattern(128, 0));
        let (outcome, _) = receive_from(packet[..70].to_vec(), 0);
        assert_eq!(outcome, Outcome::Timeout);
    }

    #[test]
    fn test_receiver_is_reusable() {
        let mut hal = ScriptedHal::with_replies([
            Reply::Bytes(frame(1, &pattern(128, 1))),
            Reply::Bytes(frame(2, &pattern(1024, 2))),
        ]);
        let mut receiver = PacketReceiver::default();
        assert!(matches!(
            receiver.receive(&mut hal, 0),
            Outcome::Packet(Packet { sequence: 1, .. })
        ));
        match receiver.receive(&mut hal, 0) {
            Outcome::Packet(packet) => assert_eq!(packet.payload, &pattern(1024, 2)[..]),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(hal.replies_left(), 0);
    }
}
