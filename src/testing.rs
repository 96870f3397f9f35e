//! Test doubles shared by the unit tests.

use std::any::Any;
use std::collections::VecDeque;

use crate::consts::{SOH, STX};
use crate::crc::crc16;
use crate::hal::Hal;

/// What the simulated sender does when the receiver waits for input.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// These bytes become readable.
    Bytes(Vec<u8>),
    /// One read times out.
    Silence,
}

/// A [`Hal`] replaying a scripted sender.
///
/// Replies are released one at a time, only when everything released before
/// has been read, so a discard throws away what is on the line but never what
/// the sender has not sent yet. `reset` panics with `"hard reset"`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHal {
    replies: VecDeque<Reply>,
    readable: VecDeque<u8>,
    pub(crate) written: Vec<u8>,
    pub(crate) discards: usize,
    pub(crate) inits: usize,
}

impl ScriptedHal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Everything written so far, lossily decoded.
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Whether the four-CAN four-BS abort sequence was written.
    pub(crate) fn aborted(&self) -> bool {
        self.written
            .windows(8)
            .any(|w| w == &[0x18u8, 0x18, 0x18, 0x18, 0x08, 0x08, 0x08, 0x08][..])
    }

    pub(crate) fn replies_left(&self) -> usize {
        self.replies.len()
    }
}

impl Hal for ScriptedHal {
    fn init(&mut self) {
        self.inits += 1;
    }

    fn read_byte(&mut self, _timeout_us: u32) -> Option<u8> {
        if self.readable.is_empty() {
            match self.replies.pop_front()? {
                Reply::Bytes(bytes) => self.readable.extend(bytes),
                Reply::Silence => return None,
            }
        }
        self.readable.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.written.push(byte);
    }

    fn discard_input(&mut self) {
        self.discards += 1;
        self.readable.clear();
    }

    fn reset(&mut self) -> ! {
        panic!("hard reset")
    }
}

/// Frames `data` as a YMODEM packet, padding with `pad` up to 128 or 1024
/// bytes depending on `data.len()`.
pub(crate) fn frame_padded(sequence: u8, data: &[u8], pad: u8) -> Vec<u8> {
    let (tag, len) = if data.len() <= 128 {
        (SOH, 128)
    } else {
        (STX, 1024)
    };
    assert!(data.len() <= len);
    let mut payload = data.to_vec();
    payload.resize(len, pad);
    let mut packet = vec![tag, sequence, !sequence];
    packet.extend_from_slice(&payload);
    packet.extend_from_slice(&crc16(&payload).to_be_bytes());
    packet
}

/// Frames `data` with the usual `0x1a` padding.
pub(crate) fn frame(sequence: u8, data: &[u8]) -> Vec<u8> {
    frame_padded(sequence, data, 0x1a)
}

/// The block-0 header announcing `name` of `size` bytes.
pub(crate) fn header(name: &str, size: usize) -> Vec<u8> {
    let mut data = name.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(format!("{size} 14567217270 100644").as_bytes());
    frame_padded(0, &data, 0)
}

/// The empty block-0 header closing a batch.
pub(crate) fn end_of_batch() -> Vec<u8> {
    frame_padded(0, &[], 0)
}

/// A deterministic non-trivial payload.
pub(crate) fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// The panic message of a call that was expected to end in [`Hal::reset`].
pub(crate) fn reset_message(result: Result<(), Box<dyn Any + Send>>) -> Option<String> {
    let payload = result.err()?;
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}
