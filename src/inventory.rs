//! Parsing of inventory responses.
//!
//! Each iterator owns the tokens of one inventory round and yields the tags
//! that pass validation. Rejected tokens are logged and skipped.

use log::{debug, warn};

use crate::types::{bytes_to_hex, is_uid_hex, parse_hex, DetectedTag, Iso14443aTag, Iso15693Tag, Uid};

/// Token the reader reports for a slot in which several tags answered
pub const COLLISION_MARKER: &str = "z";

/// ISO14443A anti-collision answer: 4-byte UID and its block-check byte
const ISO14443A_TOKEN_LEN: usize = 5;

/// Tags of one ISO15693 inventory round
#[derive(Debug)]
pub struct Iso15693Inventory {
    tokens: std::vec::IntoIter<String>,
}

impl Iso15693Inventory {
    pub(crate) fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn parse(token: &str) -> Option<Iso15693Tag> {
        let mut fields = token.split(',');
        let uid = fields.next().unwrap_or_default();
        let rssi = fields.next().unwrap_or_default();

        if uid == COLLISION_MARKER {
            debug!("Tag collision, slot needs another inventory round");
            return None;
        }
        if !is_uid_hex(uid) {
            warn!("Skipping inventory token with malformed UID: {:?}", token);
            return None;
        }

        match Uid::from_reversed(uid) {
            Ok(uid) => {
                debug!("Found tag: {} ({})", uid, rssi);
                Some(Iso15693Tag {
                    uid,
                    rssi: rssi.to_string(),
                })
            }
            Err(e) => {
                warn!("Skipping inventory token {:?}: {}", token, e);
                None
            }
        }
    }
}

impl Iterator for Iso15693Inventory {
    type Item = Iso15693Tag;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.by_ref().find_map(|token| Self::parse(&token))
    }
}

/// Tags found by one ISO14443A anti-collision run
#[derive(Debug)]
pub struct Iso14443aInventory {
    tokens: std::vec::IntoIter<String>,
}

impl Iso14443aInventory {
    pub(crate) fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn parse(token: &str) -> Option<Iso14443aTag> {
        let bytes = match parse_hex(token) {
            Some(bytes) if bytes.len() == ISO14443A_TOKEN_LEN => bytes,
            _ => {
                warn!("Encountered tag with UID of unknown length: {:?}", token);
                return None;
            }
        };

        if bytes.iter().fold(0u8, |acc, &b| acc ^ b) != 0 {
            warn!("BCC check failed for tag {:?}", token);
            return None;
        }

        let uid = bytes_to_hex(&bytes[..4]);
        debug!("Found tag: {} ({:02X})", uid, bytes[4]);
        Some(Iso14443aTag { uid })
    }
}

impl Iterator for Iso14443aInventory {
    type Item = Iso14443aTag;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.by_ref().find_map(|token| Self::parse(&token))
    }
}

/// Result of [`crate::DlpRfid2::inventory`] for the session's protocol
#[derive(Debug)]
pub enum Inventory {
    Iso15693(Iso15693Inventory),
    Iso14443a(Iso14443aInventory),
}

impl Iterator for Inventory {
    type Item = DetectedTag;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Inventory::Iso15693(inner) => inner.next().map(DetectedTag::Iso15693),
            Inventory::Iso14443a(inner) => inner.next().map(DetectedTag::Iso14443a),
        }
    }
}
