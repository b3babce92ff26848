use log::{debug, error, warn};
use std::time::Duration;

use crate::commands::{register, ReaderCommand, TagCommand};
use crate::flags::RequestFlags;
use crate::frame;
use crate::inventory::{Inventory, Iso14443aInventory, Iso15693Inventory, COLLISION_MARKER};
use crate::record::{DecodedRecord, LibraryTagRecord, RecordError, BLOCK_COUNT, BLOCK_SIZE, RECORD_LEN};
use crate::transport::RfidTransport;
use crate::types::{parse_hex, DlpError, Protocol, Result, Uid};

/// Timing and buffer settings for a reader session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout of each transport read; a read that times out ends the response
    pub read_timeout_ms: u32,
    /// Pause between sending a request and reading the reply
    pub response_delay: Duration,
    /// Upper bound on the bytes collected for one response
    pub max_response_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            response_delay: Duration::ZERO,
            max_response_len: 4096,
        }
    }
}

/// Attempt budget for writing a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per block, including the first one. Zero is rejected.
    pub max_attempts: u32,
    /// Blocking pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Used by [`DlpRfid2::write_record_to_tag`]
    pub const RECORD_WRITE: Self = Self {
        max_attempts: 20,
        delay: Duration::from_secs(1),
    };

    /// Used by [`DlpRfid2::write_raw_blocks_to_tag`] and [`DlpRfid2::erase_tag`]
    pub const RAW_WRITE: Self = Self {
        max_attempts: 10,
        delay: Duration::ZERO,
    };
}

/// Outcome of reading the library record from a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRead {
    Record(DecodedRecord),
    /// More than one tag answered the addressed read
    Conflict,
    /// No answer, an error answer, or too little data
    ReadFailed,
    /// Data was read but is not a record this crate understands
    Invalid(RecordError),
}

/// Session with a DLP-RFID2 (TRF7970A EVM) reader module
pub struct DlpRfid2<T: RfidTransport> {
    transport: T,
    config: SessionConfig,
    protocol: Option<Protocol>,
}

impl<T: RfidTransport> DlpRfid2<T> {
    /// Acknowledgement byte of a successful single block write
    const WRITE_OK: &'static str = "00";
    /// Response flags byte that precedes the data of a read
    const RESPONSE_FLAGS_LEN: usize = 1;
    const AFI_LOCKED: u8 = 0x07;
    const AFI_UNLOCKED: u8 = 0xC2;

    /// Create a new reader session with the given transport
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            protocol: None,
        }
    }

    /// Protocol selected by [`DlpRfid2::set_protocol`], if any
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Give back the transport, ending the session
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Initialize the reader and program its registers for `protocol`.
    ///
    /// Must be called before any tag or inventory command.
    pub fn set_protocol(&mut self, protocol: Protocol) -> Result<()> {
        // Answers "TRF7970A EVM"
        self.exec(ReaderCommand::Initialize, &[])?;
        self.exec(
            ReaderCommand::WriteRegister,
            &[
                register::CHIP_STATUS_CONTROL,
                register::FULL_POWER,
                register::ISO_CONTROL,
                Protocol::Iso15693.iso_control(),
            ],
        )?;
        self.exec(
            ReaderCommand::WriteRegister,
            &[
                register::CHIP_STATUS_CONTROL,
                register::FULL_POWER,
                register::ISO_CONTROL,
                protocol.iso_control(),
            ],
        )?;
        // AGC enabled
        self.exec(ReaderCommand::AgcSelect, &[0x00])?;
        // AM input
        self.exec(ReaderCommand::AmPmSelect, &[0xFF])?;

        debug!("Protocol set to {}", protocol);
        self.protocol = Some(protocol);
        Ok(())
    }

    pub fn enable_external_antenna(&mut self) -> Result<()> {
        self.exec(ReaderCommand::ExternalAntenna, &[]).map(|_| ())
    }

    pub fn enable_internal_antenna(&mut self) -> Result<()> {
        self.exec(ReaderCommand::InternalAntenna, &[]).map(|_| ())
    }

    /// Switch on one of the board LEDs (2 to 6)
    pub fn enable_led(&mut self, led: u8) -> Result<()> {
        let command = ReaderCommand::set_led(led)
            .ok_or_else(|| DlpError::InvalidParameter(format!("No such LED: {}", led)))?;
        self.exec(command, &[]).map(|_| ())
    }

    /// Switch off one of the board LEDs (2 to 6)
    pub fn disable_led(&mut self, led: u8) -> Result<()> {
        let command = ReaderCommand::clear_led(led)
            .ok_or_else(|| DlpError::InvalidParameter(format!("No such LED: {}", led)))?;
        self.exec(command, &[]).map(|_| ())
    }

    /// Run one inventory round for the configured protocol.
    ///
    /// Tags lost to collisions are not reported; call again to rescan.
    pub fn inventory(&mut self) -> Result<Inventory> {
        match self.require_protocol()? {
            Protocol::Iso15693 => self.inventory_iso15693(false).map(Inventory::Iso15693),
            Protocol::Iso14443a => self.inventory_iso14443a().map(Inventory::Iso14443a),
            Protocol::Iso14443b => Err(DlpError::Unsupported(
                "inventory is not implemented for ISO14443B".into(),
            )),
        }
    }

    /// ISO15693 inventory, 16 slots unless `single_slot` is set
    pub fn inventory_iso15693(&mut self, single_slot: bool) -> Result<Iso15693Inventory> {
        self.require_protocol()?;
        // No AFI, mask length 0
        let tokens = self.exec_iso15693(
            ReaderCommand::Inventory15693,
            RequestFlags::inventory(single_slot),
            TagCommand::Inventory,
            &[0x00],
        )?;
        Ok(Iso15693Inventory::new(tokens))
    }

    /// ISO14443A inventory.
    ///
    /// The reader runs the whole anti-collision procedure (REQA, ATQA, select
    /// all) and reports each UID followed by its block-check byte.
    pub fn inventory_iso14443a(&mut self) -> Result<Iso14443aInventory> {
        self.require_protocol()?;
        let tokens = self.exec(ReaderCommand::Inventory14443a, &[])?;
        Ok(Iso14443aInventory::new(tokens))
    }

    /// Read and decode the library record of the tag with `uid`
    pub fn read_record(&mut self, uid: &Uid) -> Result<TagRead> {
        self.require_protocol()?;
        let mut params = uid.to_bytes().to_vec();
        params.extend_from_slice(&[0x00, BLOCK_COUNT as u8]);

        let tokens = self.exec_iso15693(
            ReaderCommand::RawWrite,
            RequestFlags::addressed(),
            TagCommand::ReadMultipleBlock,
            &params,
        )?;

        let Some(token) = tokens.first() else {
            return Ok(TagRead::ReadFailed);
        };
        if token == COLLISION_MARKER {
            return Ok(TagRead::Conflict);
        }

        let bytes = parse_hex(token).unwrap_or_default();
        if bytes.len() >= 2 && bytes[0] & 0x01 != 0 {
            warn!("Tag {} answered with error code 0x{:02X}", uid, bytes[1]);
            return Ok(TagRead::ReadFailed);
        }
        if bytes.len() < Self::RESPONSE_FLAGS_LEN + RECORD_LEN {
            warn!("Read of {} returned {:?}", uid, token);
            return Ok(TagRead::ReadFailed);
        }

        let mut record = [0u8; RECORD_LEN];
        record.copy_from_slice(&bytes[Self::RESPONSE_FLAGS_LEN..Self::RESPONSE_FLAGS_LEN + RECORD_LEN]);
        Ok(match LibraryTagRecord::decode(&record) {
            Ok(decoded) => TagRead::Record(decoded),
            Err(e) => {
                warn!("Tag {}: {}", uid, e);
                TagRead::Invalid(e)
            }
        })
    }

    /// Non-addressed read of one block; returns the raw response tokens
    pub fn read_single_block(&mut self, block: u8) -> Result<Vec<String>> {
        self.require_protocol()?;
        self.exec_iso15693(
            ReaderCommand::RawWrite,
            RequestFlags::default(),
            TagCommand::ReadSingleBlock,
            &[block],
        )
    }

    /// Write one 4-byte block. `Ok(false)` when the tag did not acknowledge.
    pub fn write_block(&mut self, uid: &Uid, block: u8, data: &[u8; BLOCK_SIZE]) -> Result<bool> {
        self.require_protocol()?;
        let mut params = uid.to_bytes().to_vec();
        params.push(block);
        params.extend_from_slice(data);

        let tokens = self.exec_iso15693(
            ReaderCommand::RawWrite,
            RequestFlags::addressed(),
            TagCommand::WriteSingleBlock,
            &params,
        )?;

        if tokens.first().map(String::as_str) == Some(Self::WRITE_OK) {
            debug!("Wrote block {} successfully", block);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Write blocks `offset..offset + count` of `data`, retrying each block
    /// according to `policy`.
    ///
    /// Returns `Ok(false)` as soon as one block exhausts its attempts. Blocks
    /// written before that stay written.
    pub fn write_blocks(
        &mut self,
        uid: &Uid,
        data: &[u8; RECORD_LEN],
        offset: usize,
        count: usize,
        policy: RetryPolicy,
    ) -> Result<bool> {
        if policy.max_attempts == 0 {
            return Err(DlpError::InvalidParameter(
                "retry policy allows no write attempts".into(),
            ));
        }
        if count > BLOCK_COUNT || offset > BLOCK_COUNT - count {
            return Err(DlpError::InvalidParameter(format!(
                "{} blocks from block {} do not fit in the {} record blocks",
                count, offset, BLOCK_COUNT
            )));
        }
        self.require_protocol()?;

        for block in offset..offset + count {
            let start = block * BLOCK_SIZE;
            let mut block_data = [0u8; BLOCK_SIZE];
            block_data.copy_from_slice(&data[start..start + BLOCK_SIZE]);

            let mut attempt = 1;
            while !self.write_block(uid, block as u8, &block_data)? {
                warn!(
                    "Attempt {} of {}: write of block {} failed",
                    attempt, policy.max_attempts, block
                );
                if attempt >= policy.max_attempts {
                    warn!("Giving up on tag {}", uid);
                    return Ok(false);
                }
                attempt += 1;
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
            }
        }
        Ok(true)
    }

    /// Encode `record` and write all of it, with [`RetryPolicy::RECORD_WRITE`]
    pub fn write_record_to_tag(&mut self, uid: &Uid, record: &LibraryTagRecord) -> Result<bool> {
        let data = record.encode();
        debug!("Writing record to {}: {:02X?}", uid, data);
        self.write_blocks(uid, &data, 0, BLOCK_COUNT, RetryPolicy::RECORD_WRITE)
    }

    /// Write raw blocks with [`RetryPolicy::RAW_WRITE`]
    pub fn write_raw_blocks_to_tag(
        &mut self,
        uid: &Uid,
        data: &[u8; RECORD_LEN],
        offset: usize,
        count: usize,
    ) -> Result<bool> {
        self.write_blocks(uid, data, offset, count, RetryPolicy::RAW_WRITE)
    }

    /// Overwrite the record area with zeros, leaving a blank tag
    pub fn erase_tag(&mut self, uid: &Uid) -> Result<bool> {
        self.write_raw_blocks_to_tag(uid, &[0u8; RECORD_LEN], 0, BLOCK_COUNT)
    }

    /// Write a patron card record for `user_id`
    pub fn write_patron_card(
        &mut self,
        uid: &Uid,
        user_id: &str,
        country: &str,
        library_number: &str,
    ) -> Result<bool> {
        let data = LibraryTagRecord::patron_card(user_id, country, library_number).encode();
        debug!("Writing patron card to {}: {:02X?}", uid, data);
        self.write_raw_blocks_to_tag(uid, &data, 0, BLOCK_COUNT)
    }

    /// Set the AFI of the tag in the field to the "on loan" value
    pub fn lock_afi(&mut self) -> Result<Vec<String>> {
        self.require_protocol()?;
        self.exec_iso15693(
            ReaderCommand::RawWrite,
            RequestFlags::default(),
            TagCommand::WriteAfi,
            &[Self::AFI_LOCKED],
        )
    }

    /// Set the AFI of the tag in the field to the "on shelf" value
    pub fn unlock_afi(&mut self) -> Result<Vec<String>> {
        self.require_protocol()?;
        let flags = RequestFlags {
            high_data_rate: true,
            ..RequestFlags::default()
        };
        self.exec_iso15693(
            ReaderCommand::RawWrite,
            flags,
            TagCommand::WriteAfi,
            &[Self::AFI_UNLOCKED],
        )
    }

    fn require_protocol(&self) -> Result<Protocol> {
        self.protocol.ok_or(DlpError::ProtocolNotSelected)
    }

    fn exec_iso15693(
        &mut self,
        command: ReaderCommand,
        flags: RequestFlags,
        tag_command: TagCommand,
        data: &[u8],
    ) -> Result<Vec<String>> {
        let mut params = Vec::with_capacity(2 + data.len());
        params.push(flags.to_byte());
        params.push(tag_command.code());
        params.extend_from_slice(data);
        self.exec(command, &params)
    }

    fn exec(&mut self, command: ReaderCommand, params: &[u8]) -> Result<Vec<String>> {
        let wire = frame::to_wire(&frame::encode(command.code(), params)?);

        self.transport
            .clear_input()
            .map_err(|e| DlpError::Transport(format!("{:?}", e)))?;
        debug!("SEND{:3}: {}", wire.len() / 2, wire);
        self.transport
            .write(wire.as_bytes())
            .map_err(|e| DlpError::Transport(format!("{:?}", e)))?;
        if !self.config.response_delay.is_zero() {
            std::thread::sleep(self.config.response_delay);
        }

        let mut response = Vec::new();
        let mut chunk = [0u8; 256];
        while response.len() < self.config.max_response_len {
            match self.transport.read(&mut chunk, self.config.read_timeout_ms) {
                Ok(0) => break,
                Ok(bytes_read) => response.extend_from_slice(&chunk[..bytes_read]),
                Err(e) => {
                    error!("Read error: {:?}", e);
                    return Err(DlpError::Transport(format!("{:?}", e)));
                }
            }
        }
        debug!("RETR{:3}: {:?}", response.len(), String::from_utf8_lossy(&response));

        Ok(frame::decode(&response))
    }
}
