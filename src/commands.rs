//! Command code tables.
//!
//! Reader commands are the first byte after the frame header and are executed
//! by the EVM firmware. Tag commands travel inside a RAWWRITE or inventory
//! request and are sent over the air (codes from the M24LR64E-R datasheet).

/// Commands understood by the reader module firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReaderCommand {
    WriteRegister = 0x10,
    Inventory15693 = 0x14,
    /// Everything after this byte is transmitted over the air as is
    RawWrite = 0x18,
    InternalAntenna = 0x2A,
    ExternalAntenna = 0x2B,
    GpioMux = 0x2C,
    GpioConfig = 0x2D,
    Inventory14443a = 0xA0,
    AgcSelect = 0xF0,
    AmPmSelect = 0xF1,
    SetLed2 = 0xFB,
    SetLed3 = 0xF9,
    SetLed4 = 0xF7,
    SetLed5 = 0xF5,
    SetLed6 = 0xF3,
    ClearLed2 = 0xFC,
    ClearLed3 = 0xFA,
    ClearLed4 = 0xF8,
    ClearLed5 = 0xF6,
    ClearLed6 = 0xF4,
    Initialize = 0xFF,
}

impl ReaderCommand {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Set command for LED `led`, if the board has it
    pub fn set_led(led: u8) -> Option<Self> {
        match led {
            2 => Some(Self::SetLed2),
            3 => Some(Self::SetLed3),
            4 => Some(Self::SetLed4),
            5 => Some(Self::SetLed5),
            6 => Some(Self::SetLed6),
            _ => None,
        }
    }

    /// Clear command for LED `led`, if the board has it
    pub fn clear_led(led: u8) -> Option<Self> {
        match led {
            2 => Some(Self::ClearLed2),
            3 => Some(Self::ClearLed3),
            4 => Some(Self::ClearLed4),
            5 => Some(Self::ClearLed5),
            6 => Some(Self::ClearLed6),
            _ => None,
        }
    }
}

/// ISO15693 tag commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TagCommand {
    Inventory = 0x01,
    StayQuiet = 0x02,
    ReadSingleBlock = 0x20,
    WriteSingleBlock = 0x21,
    ReadMultipleBlock = 0x23,
    Select = 0x25,
    ResetToReady = 0x26,
    WriteAfi = 0x27,
    LockAfi = 0x28,
    WriteDsfid = 0x29,
    LockDsfid = 0x2A,
    GetSystemInfo = 0x2B,
}

impl TagCommand {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// TRF7970A register addresses written during protocol setup
pub mod register {
    pub const CHIP_STATUS_CONTROL: u8 = 0x00;
    pub const ISO_CONTROL: u8 = 0x01;

    /// Chip status control value for full power (0x31 would be half power)
    pub const FULL_POWER: u8 = 0x21;
}
