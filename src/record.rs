//! Danish library RFID data model record.
//!
//! Layout of the 32 bytes at the start of tag memory (8 blocks of 4 bytes):
//!
//! | bytes  | field                                  |
//! |--------|----------------------------------------|
//! | 0      | version (high nibble), usage (low)     |
//! | 1      | number of parts in the item            |
//! | 2      | ordinal number of this part            |
//! | 3..19  | item id, ASCII, NUL padded             |
//! | 19..21 | checksum, stored byte reversed         |
//! | 21..23 | country, ASCII                         |
//! | 23..32 | library number, ASCII, NUL padded      |
//!
//! Reference: RFID Data Model for Libraries (February 2009), p. 30.
//!
//! Text fields are ASCII. Longer ones are truncated to their slot when
//! encoding, never inside a character.

use std::fmt;

use thiserror::Error;

use crate::crc;

pub const RECORD_LEN: usize = 32;
pub const BLOCK_SIZE: usize = 4;
pub const BLOCK_COUNT: usize = RECORD_LEN / BLOCK_SIZE;

const ITEM_ID: std::ops::Range<usize> = 3..19;
const CHECKSUM: std::ops::Range<usize> = 19..21;
const COUNTRY: std::ops::Range<usize> = 21..23;
const LIBRARY: std::ops::Range<usize> = 23..32;

/// What the tagged object is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageType {
    Acquisition,
    ForCirculation,
    NotForCirculation,
    Discarded,
    PatronCard,
}

impl UsageType {
    pub fn code(self) -> u8 {
        match self {
            UsageType::Acquisition => 0x0,
            UsageType::ForCirculation => 0x1,
            UsageType::NotForCirculation => 0x2,
            UsageType::Discarded => 0x7,
            UsageType::PatronCard => 0x8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(UsageType::Acquisition),
            0x1 => Some(UsageType::ForCirculation),
            0x2 => Some(UsageType::NotForCirculation),
            0x7 => Some(UsageType::Discarded),
            0x8 => Some(UsageType::PatronCard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UsageType::Acquisition => "acquisition",
            UsageType::ForCirculation => "for-circulation",
            UsageType::NotForCirculation => "not-for-circulation",
            UsageType::Discarded => "discarded",
            UsageType::PatronCard => "patron-card",
        }
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record could not be interpreted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("unknown-version: {0}")]
    UnknownVersion(u8),
    #[error("unknown-usage-type: {0}")]
    UnknownUsageType(u8),
}

impl RecordError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::UnknownVersion(_) => "unknown-version",
            RecordError::UnknownUsageType(_) => "unknown-usage-type",
        }
    }
}

/// Library data stored on a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTagRecord {
    /// Data model version, 0 or 1
    pub version: u8,
    pub usage_type: UsageType,
    pub nparts: u8,
    pub partno: u8,
    pub item_id: String,
    /// Checksum bytes as stored on the tag. Ignored by [`LibraryTagRecord::encode`].
    pub checksum: [u8; 2],
    /// ISO 3166 country code, e.g. `NO`
    pub country: String,
    pub library_number: String,
}

/// Result of decoding a record read from a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub record: LibraryTagRecord,
    /// First byte was zero; nothing has been written to this tag yet
    pub is_blank: bool,
    pub checksum_valid: bool,
}

impl LibraryTagRecord {
    /// Record for one part of a circulating library item
    pub fn item(
        item_id: impl Into<String>,
        partno: u8,
        nparts: u8,
        country: impl Into<String>,
        library_number: impl Into<String>,
    ) -> Self {
        Self {
            version: 1,
            usage_type: UsageType::ForCirculation,
            nparts,
            partno,
            item_id: item_id.into(),
            checksum: [0, 0],
            country: country.into(),
            library_number: library_number.into(),
        }
    }

    /// Record for a patron card; the user id goes into the item id field
    pub fn patron_card(
        user_id: impl Into<String>,
        country: impl Into<String>,
        library_number: impl Into<String>,
    ) -> Self {
        Self {
            version: 1,
            usage_type: UsageType::PatronCard,
            nparts: 1,
            partno: 1,
            item_id: user_id.into(),
            checksum: [0, 0],
            country: country.into(),
            library_number: library_number.into(),
        }
    }

    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Result<DecodedRecord, RecordError> {
        let version = bytes[0] >> 4;
        if version > 1 {
            return Err(RecordError::UnknownVersion(version));
        }
        let usage_code = bytes[0] & 0x0F;
        let usage_type =
            UsageType::from_code(usage_code).ok_or(RecordError::UnknownUsageType(usage_code))?;

        let checksum = [bytes[CHECKSUM.start], bytes[CHECKSUM.start + 1]];
        let [hi, lo] = crc::compute(&crc::checksum_input(bytes));
        let checksum_valid = checksum == [lo, hi];

        let record = Self {
            version,
            usage_type,
            nparts: bytes[1],
            partno: bytes[2],
            item_id: read_text(&bytes[ITEM_ID]),
            checksum,
            country: read_text(&bytes[COUNTRY]),
            library_number: read_text(&bytes[LIBRARY]),
        };

        Ok(DecodedRecord {
            record,
            is_blank: bytes[0] == 0,
            checksum_valid,
        })
    }

    /// Tag memory image of this record with a freshly computed checksum
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[0] = ((self.version & 0x0F) << 4) | self.usage_type.code();
        bytes[1] = self.nparts;
        bytes[2] = self.partno;
        write_text(&mut bytes[ITEM_ID], &self.item_id);
        write_text(&mut bytes[COUNTRY], &self.country);
        write_text(&mut bytes[LIBRARY], &self.library_number);

        let [hi, lo] = crc::compute(&crc::checksum_input(&bytes));
        bytes[CHECKSUM.start] = lo;
        bytes[CHECKSUM.start + 1] = hi;
        bytes
    }
}

fn read_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn write_text(slot: &mut [u8], text: &str) {
    let mut len = text.len().min(slot.len());
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    slot[..len].copy_from_slice(&text.as_bytes()[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> LibraryTagRecord {
        LibraryTagRecord::item("03011234567890", 1, 2, "NO", "1030310")
    }

    #[test]
    fn encode_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes[0], 0x11);
        assert_eq!(bytes[1], 2);
        assert_eq!(bytes[2], 1);
        assert_eq!(&bytes[3..17], b"03011234567890");
        assert_eq!(&bytes[17..19], &[0, 0]);
        assert_eq!(&bytes[21..23], b"NO");
        assert_eq!(&bytes[23..30], b"1030310");
        assert_eq!(&bytes[30..32], &[0, 0]);
    }

    #[test]
    fn encode_stores_checksum_reversed() {
        let bytes = sample().encode();
        let crc = crc::crc16(&crc::checksum_input(&bytes));
        assert_eq!(u16::from_le_bytes([bytes[19], bytes[20]]), crc);
    }

    #[test]
    fn decode_encoded_record() {
        let bytes = sample().encode();
        let decoded = LibraryTagRecord::decode(&bytes).unwrap();
        assert!(decoded.checksum_valid);
        assert!(!decoded.is_blank);
        assert_eq!(decoded.record.usage_type, UsageType::ForCirculation);
        assert_eq!(decoded.record.item_id, "03011234567890");
        assert_eq!(decoded.record.library_number, "1030310");
        assert_eq!(decoded.record.checksum, [bytes[19], bytes[20]]);
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let mut bytes = sample().encode();
        bytes[5] ^= 0x01;
        let decoded = LibraryTagRecord::decode(&bytes).unwrap();
        assert!(!decoded.checksum_valid);
    }

    #[test]
    fn unknown_version() {
        let mut bytes = sample().encode();
        bytes[0] = 0x21;
        let err = LibraryTagRecord::decode(&bytes).unwrap_err();
        assert_eq!(err, RecordError::UnknownVersion(2));
        assert_eq!(err.kind(), "unknown-version");
    }

    #[test]
    fn unknown_usage_type() {
        let mut bytes = sample().encode();
        bytes[0] = 0x13;
        let err = LibraryTagRecord::decode(&bytes).unwrap_err();
        assert_eq!(err, RecordError::UnknownUsageType(3));
        assert_eq!(err.kind(), "unknown-usage-type");
    }

    #[test]
    fn blank_tag() {
        let decoded = LibraryTagRecord::decode(&[0u8; RECORD_LEN]).unwrap();
        assert!(decoded.is_blank);
        assert_eq!(decoded.record.item_id, "");
        assert_eq!(decoded.record.usage_type, UsageType::Acquisition);
    }

    #[test]
    fn long_fields_are_truncated() {
        let record = LibraryTagRecord::item("ABCDEFGHIJKLMNOPQRSTU", 1, 1, "DKK", "1234567890123");
        let decoded = LibraryTagRecord::decode(&record.encode()).unwrap();
        assert!(decoded.checksum_valid);
        assert_eq!(decoded.record.item_id, "ABCDEFGHIJKLMNOP");
        assert_eq!(decoded.record.country, "DK");
        assert_eq!(decoded.record.library_number, "123456789");
    }

    #[test]
    fn truncation_keeps_whole_characters() {
        // 'Å' is two bytes and would straddle the end of the item id slot
        let record = LibraryTagRecord::item("ABCDEFGHIJKLMNOÅ", 1, 1, "NO", "1030310");
        let bytes = record.encode();
        assert_eq!(bytes[18], 0);
        let decoded = LibraryTagRecord::decode(&bytes).unwrap();
        assert!(decoded.checksum_valid);
        assert_eq!(decoded.record.item_id, "ABCDEFGHIJKLMNO");
    }

    #[test]
    fn patron_card_header() {
        let bytes = LibraryTagRecord::patron_card("U1234", "NO", "1030310").encode();
        assert_eq!(bytes[0], 0x18);
        assert_eq!(bytes[1], 1);
        assert_eq!(bytes[2], 1);
    }

    #[test]
    fn usage_type_codes() {
        for usage in [
            UsageType::Acquisition,
            UsageType::ForCirculation,
            UsageType::NotForCirculation,
            UsageType::Discarded,
            UsageType::PatronCard,
        ] {
            assert_eq!(UsageType::from_code(usage.code()), Some(usage));
        }
        assert_eq!(UsageType::PatronCard.to_string(), "patron-card");
    }

    fn usage_type() -> impl Strategy<Value = UsageType> {
        prop_oneof![
            Just(UsageType::Acquisition),
            Just(UsageType::ForCirculation),
            Just(UsageType::NotForCirculation),
            Just(UsageType::Discarded),
            Just(UsageType::PatronCard),
        ]
    }

    proptest! {
        #[test]
        fn encode_decode_preserves_fields(
            version in 0u8..=1,
            usage_type in usage_type(),
            nparts in any::<u8>(),
            partno in any::<u8>(),
            item_id in "[ -~]{0,16}",
            country in "[A-Z]{0,2}",
            library_number in "[0-9]{0,9}",
        ) {
            let record = LibraryTagRecord {
                version,
                usage_type,
                nparts,
                partno,
                item_id,
                checksum: [0, 0],
                country,
                library_number,
            };
            let bytes = record.encode();
            let decoded = LibraryTagRecord::decode(&bytes).unwrap();
            prop_assert!(decoded.checksum_valid);
            prop_assert_eq!(decoded.record, LibraryTagRecord {
                checksum: [bytes[19], bytes[20]],
                ..record
            });
        }
    }
}
