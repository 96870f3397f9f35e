//! CRC16 as used by XMODEM/YMODEM.
//!
//! CCITT polynomial `0x1021`, initial value `0`, MSB first, no final XOR.
//! Running the CRC over a block followed by its own big-endian CRC yields
//! zero, which is how received packets are checked.

const POLY: u16 = 0x1021;

/// Folds one byte into a running CRC.
pub fn crc16_update(crc: u16, data: u8) -> u16 {
    let mut crc = crc ^ (u16::from(data) << 8);
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// Computes the CRC16 of `bytes`.
///
/// ```rust
/// assert_eq!(ymodem_boot::crc::crc16(b"123456789"), 0x31c3);
/// assert_eq!(ymodem_boot::crc::crc16(&[]), 0);
/// ```
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |crc, &b| crc16_update(crc, b))
}
