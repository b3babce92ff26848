//! ISO15693 request flags byte.
//!
//! Bit layout (bit 8 is the MSB), see the TRF7970A EVM user's guide:
//!
//! | bit | inventory = 1 | inventory = 0 |
//! |-----|---------------|---------------|
//! | 8   | RFU (0)       | RFU (0)       |
//! | 7   | option        | option        |
//! | 6   | single slot   | address       |
//! | 5   | AFI present   | select        |
//! | 4   | protocol ext. | protocol ext. |
//! | 3   | inventory     | inventory     |
//! | 2   | high data rate| high data rate|
//! | 1   | double sub-carrier | double sub-carrier |
//!
//! Bits 6 and 5 change meaning with the inventory flag.

/// Named options folded into a single flags byte by [`RequestFlags::to_byte`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    pub double_sub_carrier: bool,
    pub high_data_rate: bool,
    pub inventory: bool,
    pub protocol_extension: bool,
    /// Only used when `inventory` is set
    pub afi: bool,
    /// Only used when `inventory` is set
    pub single_slot: bool,
    pub option: bool,
    /// Only used when `inventory` is not set
    pub select: bool,
    /// Only used when `inventory` is not set
    pub address: bool,
}

impl RequestFlags {
    /// Flags for an inventory request
    pub fn inventory(single_slot: bool) -> Self {
        Self {
            inventory: true,
            single_slot,
            ..Self::default()
        }
    }

    /// Flags for a request addressed to one tag by UID
    pub fn addressed() -> Self {
        Self {
            address: true,
            ..Self::default()
        }
    }

    pub fn to_byte(&self) -> u8 {
        let (bit6, bit5) = if self.inventory {
            (self.single_slot, self.afi)
        } else {
            (self.address, self.select)
        };

        (u8::from(self.option) << 6)
            | (u8::from(bit6) << 5)
            | (u8::from(bit5) << 4)
            | (u8::from(self.protocol_extension) << 3)
            | (u8::from(self.inventory) << 2)
            | (u8::from(self.high_data_rate) << 1)
            | u8::from(self.double_sub_carrier)
    }
}
