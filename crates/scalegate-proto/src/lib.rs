//! Wire codec for the Suwol1000 weighing-station indicator.
//!
//! The indicator exchanges fixed-size ASCII frames over a serial line:
//! a 32-byte request ([`RequestPacket`]) drives the display, relays and
//! voice announcements, and a 53-byte response ([`ResponsePacket`]) reports
//! the current weight, RFID reader, operator keypad and environmental
//! state. Frames are delimited by [`STX`]/[`ETX`]; every other byte is
//! printable ASCII.
//!
//! The relay field uses the indicator's ASCII-nibble encoding (each 4-bit
//! value `n` is sent as the byte `'0' + n`, so values 10..=15 appear as
//! `:;<=>?`). This is NOT hexadecimal; see [`relay`] for details.

mod codes;
mod error;
pub mod relay;
mod request;
mod response;

pub use codes::{CommandCode, InputCode, PrinterStatus, VoiceCode};
pub use error::{ProtocolError, Result};
pub use relay::RelayFlags;
pub use request::{REQUEST_LEN, RequestPacket};
pub use response::{RESPONSE_LEN, RFID_NONE, ResponsePacket};

/// Start-of-frame delimiter.
pub const STX: u8 = 0x02;

/// End-of-frame delimiter.
pub const ETX: u8 = 0x03;
