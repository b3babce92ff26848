//! Driver for the DLP-RFID2 / TRF7970A EVM reader module, with support for
//! the Danish library RFID data model.
//!
//! # Logging
//!
//! Requests, responses and rejected tags are traced through the [`log`]
//! facade. Install any `log` backend to see them.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use dlp_rfid2::{DlpRfid2, Protocol, SerialTransport, TagRead};
//!
//! let transport = SerialTransport::new("/dev/ttyACM0")?;
//! let mut reader = DlpRfid2::new(transport);
//! reader.set_protocol(Protocol::Iso15693)?;
//!
//! for tag in reader.inventory_iso15693(false)?.collect::<Vec<_>>() {
//!     if let TagRead::Record(item) = reader.read_record(&tag.uid)? {
//!         println!("{}: {} (part {} of {})", tag.uid, item.record.item_id,
//!             item.record.partno, item.record.nparts);
//!     }
//! }
//! ```

pub mod commands;
pub mod crc;
pub mod flags;
pub mod frame;
mod inventory;
mod reader;
pub mod record;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use flags::RequestFlags;
pub use inventory::{Inventory, Iso14443aInventory, Iso15693Inventory, COLLISION_MARKER};
pub use reader::{DlpRfid2, RetryPolicy, SessionConfig, TagRead};
pub use record::{DecodedRecord, LibraryTagRecord, RecordError, UsageType};
pub use transport::RfidTransport;
pub use types::{
    reverse_uid, DetectedTag, DlpError, Iso14443aTag, Iso15693Tag, Protocol, Result, Uid,
};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
