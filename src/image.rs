//! Legacy uImage header.
//!
//! Every downloaded file starts with this fixed 64-byte, big-endian header:
//!
//! | Offset | Size | Field            |
//! |--------|------|------------------|
//! | 0      | 4    | magic            |
//! | 4      | 4    | header checksum  |
//! | 8      | 4    | timestamp        |
//! | 12     | 4    | payload size     |
//! | 16     | 4    | load address     |
//! | 20     | 4    | entry point      |
//! | 24     | 4    | payload checksum |
//! | 28     | 1    | OS               |
//! | 29     | 1    | architecture     |
//! | 30     | 1    | image type       |
//! | 31     | 1    | compression      |
//! | 32     | 32   | name             |
//!
//! Only the magic and the payload size are checked. The checksums are read
//! but not verified.

use thiserror::Error;

use crate::consts::{IMAGE_HEADER_LEN, IMAGE_NAME_LEN, UIMAGE_MAGIC};

/// Why a downloaded image cannot be booted.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LoadError {
    /// Fewer bytes than a header are available.
    #[error("image too short for a header ({available:#010x} bytes)")]
    HeaderTruncated {
        /// Bytes available.
        available: usize,
    },
    /// The magic number is wrong.
    #[error("invalid uimage magic {found:#010x} (expected: 0x27051956)")]
    BadMagic {
        /// Magic read from the header.
        found: u32,
    },
    /// The header announces more payload than was received.
    #[error("invalid uimage size {declared:#010x} (received only {received:#010x} bytes)")]
    Truncated {
        /// Payload size from the header.
        declared: u32,
        /// Bytes received, header included.
        received: usize,
    },
}

/// Decoded uImage header.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ImageHeader {
    /// Must be [`UIMAGE_MAGIC`].
    pub magic: u32,
    /// Header checksum.
    pub header_crc: u32,
    /// Creation time, seconds since the epoch.
    pub timestamp: u32,
    /// Payload length in bytes.
    pub size: u32,
    /// Where the payload has to be copied.
    pub load_address: u32,
    /// Where execution starts.
    pub entry_point: u32,
    /// Payload checksum.
    pub data_crc: u32,
    /// Operating system tag.
    pub os: u8,
    /// CPU architecture tag.
    pub arch: u8,
    /// Image type tag.
    pub image_type: u8,
    /// Compression type tag.
    pub compression: u8,
    /// NUL-padded image name.
    pub name: [u8; IMAGE_NAME_LEN],
}

impl ImageHeader {
    /// Decodes the header at the start of `bytes`.
    ///
    /// No field is checked here, see [`ImageHeader::validate`].
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let Some(raw) = bytes.first_chunk::<IMAGE_HEADER_LEN>() else {
            return Err(LoadError::HeaderTruncated {
                available: bytes.len(),
            });
        };
        let word = |offset: usize| {
            u32::from_be_bytes([
                raw[offset],
                raw[offset + 1],
                raw[offset + 2],
                raw[offset + 3],
            ])
        };
        let mut name = [0; IMAGE_NAME_LEN];
        name.copy_from_slice(&raw[32..]);
        Ok(Self {
            magic: word(0),
            header_crc: word(4),
            timestamp: word(8),
            size: word(12),
            load_address: word(16),
            entry_point: word(20),
            data_crc: word(24),
            os: raw[28],
            arch: raw[29],
            image_type: raw[30],
            compression: raw[31],
            name,
        })
    }

    /// Checks the magic, then that `received` bytes cover header and payload.
    pub fn validate(&self, received: usize) -> Result<(), LoadError> {
        if self.magic != UIMAGE_MAGIC {
            return Err(LoadError::BadMagic { found: self.magic });
        }
        let needed = IMAGE_HEADER_LEN as u64 + u64::from(self.size);
        if (received as u64) < needed {
            return Err(LoadError::Truncated {
                declared: self.size,
                received,
            });
        }
        Ok(())
    }

    /// Payload length as a `usize`.
    pub fn payload_len(&self) -> usize {
        self.size as usize
    }

    /// The image name up to its first NUL, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(IMAGE_NAME_LEN);
        core::str::from_utf8(&self.name[..end]).ok()
    }
}
