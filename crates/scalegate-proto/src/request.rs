//! Host-to-indicator request frame.

use crate::{
    ETX, STX,
    codes::{CommandCode, VoiceCode},
    relay::{RelayFlags, encode_relay},
};

/// Serialized request frame length in bytes.
pub const REQUEST_LEN: usize = 32;

/// One polling request to the indicator.
///
/// Every poll repaints the display, so callers echo the last known weight
/// and plate rather than sending deltas. Fields wider than their wire slot
/// are clamped: the weight keeps its leading seven digits, the plate its
/// trailing six characters.
///
/// Layout (all offsets in bytes):
///
/// ```text
/// 0     STX
/// 1     device id, last decimal digit
/// 2     command code letter
/// 3..11 weight: sign, then |w| right-justified in 7
/// 11..17 plate, right-justified in 6
/// 17..23 reserved (spaces)
/// 23..25 relay flags, ASCII-nibble pair
/// 25..27 voice code, two decimal digits
/// 27..31 reserved (spaces)
/// 31    ETX
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestPacket {
    /// Target device, 0..=9 meaningful; only the last decimal digit is sent.
    pub device_id: u8,
    /// Command selector.
    pub command_code: CommandCode,
    /// Weight to display, integer kilograms.
    pub display_weight: i32,
    /// Plate text to display; the trailing six characters are sent.
    pub display_plate: String,
    /// Blink the green lamp.
    pub green_blink: bool,
    /// Blink the red lamp.
    pub red_blink: bool,
    /// Announcement to play.
    pub voice_code: VoiceCode,
}

impl RequestPacket {
    /// Serialize to the fixed wire form.
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut frame = [b' '; REQUEST_LEN];
        frame[0] = STX;
        frame[1] = b'0' + self.device_id % 10;
        frame[2] = self.command_code.to_wire();

        frame[3] = if self.display_weight < 0 { b'-' } else { b'+' };
        let magnitude = self.display_weight.unsigned_abs().to_string();
        let digits = &magnitude.as_bytes()[..magnitude.len().min(7)];
        frame[11 - digits.len()..11].copy_from_slice(digits);

        // Plates are ASCII in practice; clamp the byte cut to a char
        // boundary so odd input cannot split a code point.
        let plate = self.display_plate.as_bytes();
        let mut start = plate.len().saturating_sub(6);
        while !self.display_plate.is_char_boundary(start) {
            start += 1;
        }
        let tail = &plate[start..];
        frame[17 - tail.len()..17].copy_from_slice(tail);

        let relay = RelayFlags::lamps(self.green_blink, self.red_blink);
        frame[23..25].copy_from_slice(&encode_relay(relay.bits()));

        let voice = self.voice_code.to_wire();
        frame[25] = b'0' + voice / 10;
        frame[26] = b'0' + voice % 10;

        frame[31] = ETX;
        frame
    }
}
