//! Reader module request framing and response token extraction.
//!
//! Request layout:
//!
//! ```text
//! SOF(01) LEN_LO LEN_HI READER_TYPE(03) ENTITY(04) CMD PARAMS... EOF(00 00)
//! ```
//!
//! `LEN` counts every byte of the frame, SOF and EOF included. The frame is
//! written to the link as uppercase ASCII hex. Responses are free text in which
//! each datum is enclosed in square brackets.

use crate::types::{bytes_to_hex, DlpError, Result};

pub const SOF: u8 = 0x01;
pub const READER_TYPE: u8 = 0x03;
pub const ENTITY: u8 = 0x04;
pub const EOF: [u8; 2] = [0x00, 0x00];

/// Build a raw request frame for `command` with `params`.
///
/// Fails when the frame would not fit the 16-bit length field.
pub fn encode(command: u8, params: &[u8]) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(8 + params.len());
    frame.push(SOF);
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(&[READER_TYPE, ENTITY, command]);
    frame.extend_from_slice(params);
    frame.extend_from_slice(&EOF);

    let len = u16::try_from(frame.len()).map_err(|_| {
        DlpError::InvalidParameter(format!("{} byte frame exceeds the length field", frame.len()))
    })?;
    frame[1..3].copy_from_slice(&len.to_le_bytes());
    Ok(frame)
}

/// ASCII text actually transmitted for `frame`
pub fn to_wire(frame: &[u8]) -> String {
    bytes_to_hex(frame)
}

/// Every bracket-delimited token in `response`, in order of appearance.
///
/// An unterminated trailing `[` is ignored. No tokens is not an error; it is
/// how the reader says "nothing found".
pub fn decode(response: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(response);
    let mut tokens = Vec::new();
    let mut rest: &str = &text;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => {
                tokens.push(after[..close].to_string());
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    tokens
}
