//! Types for reader and tag operations

use std::fmt;

use thiserror::Error;

/// Air interface the reader is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Iso15693,
    Iso14443a,
    Iso14443b,
}

impl Protocol {
    /// Value of the TRF7970A ISO Control register (0x01) for this protocol
    pub fn iso_control(self) -> u8 {
        match self {
            Protocol::Iso15693 => 0x00,
            Protocol::Iso14443a => 0x09,
            Protocol::Iso14443b => 0x0C,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Iso15693 => "ISO15693",
            Protocol::Iso14443a => "ISO14443A",
            Protocol::Iso14443b => "ISO14443B",
        };
        f.write_str(name)
    }
}

/// ISO15693 tag identifier in natural (display) order, e.g. `E004015012345678`.
///
/// Inventory responses list the UID with its byte pairs reversed
/// ([`Uid::from_reversed`]); addressed commands carry it in natural order
/// ([`Uid::to_bytes`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid([u8; 8]);

impl Uid {
    pub const HEX_LEN: usize = 16;

    /// Parse a UID given in natural order
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = parse_hex(s)
            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
            .ok_or_else(|| {
                DlpError::InvalidParameter(format!(
                    "UID must be {} hex characters, got {:?}",
                    Self::HEX_LEN,
                    s
                ))
            })?;
        Ok(Self(bytes))
    }

    /// Build a UID from the byte-reversed form found in inventory responses
    pub fn from_reversed(s: &str) -> Result<Self> {
        Self::parse(&reverse_uid(s)?)
    }

    /// Natural-order bytes, as sent in addressed requests
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0
    }

    /// Byte-pair-reversed hex string, as reported by inventory
    pub fn to_reversed(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        bytes_to_hex(&bytes)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes_to_hex(&self.0))
    }
}

impl std::str::FromStr for Uid {
    type Err = DlpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Reverse a 16-hex-character UID in two-character groups, back to front.
///
/// `reverse_uid(&reverse_uid(x)?)? == x` for every well-formed UID.
pub fn reverse_uid(uid: &str) -> Result<String> {
    if uid.len() != Uid::HEX_LEN {
        return Err(DlpError::InvalidParameter(format!(
            "Wrong UID size {}, should be {}",
            uid.len(),
            Uid::HEX_LEN
        )));
    }
    if !is_uid_hex(uid) {
        return Err(DlpError::InvalidParameter(format!(
            "UID contains non-hex characters: {:?}",
            uid
        )));
    }
    Ok(uid
        .as_bytes()
        .chunks(2)
        .rev()
        .flat_map(|pair| pair.iter().map(|&b| b as char))
        .collect())
}

pub(crate) fn is_uid_hex(s: &str) -> bool {
    s.len() == Uid::HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Tag found by an ISO15693 inventory round
#[derive(Debug, Clone)]
pub struct Iso15693Tag {
    pub uid: Uid,
    /// Signal strength exactly as reported by the reader
    pub rssi: String,
}

impl PartialEq for Iso15693Tag {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

/// Tag found by the ISO14443A anti-collision procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iso14443aTag {
    /// 4-byte UID as 8 uppercase hex characters
    pub uid: String,
}

/// A tag yielded by [`crate::DlpRfid2::inventory`]
#[derive(Debug, Clone, PartialEq)]
pub enum DetectedTag {
    Iso15693(Iso15693Tag),
    Iso14443a(Iso14443aTag),
}

impl DetectedTag {
    /// UID as uppercase hex, natural order
    pub fn uid(&self) -> String {
        match self {
            DetectedTag::Iso15693(tag) => tag.uid.to_string(),
            DetectedTag::Iso14443a(tag) => tag.uid.clone(),
        }
    }
}

/// Errors that can occur during reader operations
#[derive(Error, Debug)]
pub enum DlpError {
    /// Transport layer error (serial port, etc.). The session should be discarded.
    #[error("transport error: {0}")]
    Transport(String),
    /// A tag command was issued before [`crate::DlpRfid2::set_protocol`]
    #[error("no protocol selected, call set_protocol first")]
    ProtocolNotSelected,
    /// Invalid parameter passed to a function
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Operation not available for the configured protocol
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DlpError>;

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Parse a hex string without separators. `None` on odd length or bad digits.
pub(crate) fn parse_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
