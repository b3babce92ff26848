//! Checksum of the Danish library RFID data model.
//!
//! CRC-16 with polynomial x^16 + x^12 + x^5 + 1 (0x1021), initial value 0xFFFF,
//! MSB first, no reflection and no final XOR. The record checksum is taken over
//! the buffer built by [`checksum_input`].

/// Length of the record checksum input: 19 + 11 record bytes and two zero bytes
pub const INPUT_LEN: usize = 32;

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = INIT;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Checksum of a record buffer as `[high, low]`.
///
/// The tag stores these two bytes reversed.
pub fn compute(buffer: &[u8; INPUT_LEN]) -> [u8; 2] {
    crc16(buffer).to_be_bytes()
}

/// Bytes `0..19` and `21..32` of a record followed by two zero bytes
pub fn checksum_input(record: &[u8; 32]) -> [u8; INPUT_LEN] {
    let mut buf = [0u8; INPUT_LEN];
    buf[..19].copy_from_slice(&record[..19]);
    buf[19..30].copy_from_slice(&record[21..32]);
    buf
}
