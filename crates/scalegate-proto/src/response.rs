//! Indicator-to-host response frame.

use crate::{
    ETX, STX,
    codes::{CommandCode, InputCode, PrinterStatus, VoiceCode},
    error::{ProtocolError, Result},
    relay::{RelayFlags, decode_relay},
};

/// Serialized response frame length in bytes.
pub const RESPONSE_LEN: usize = 53;

/// Sentinel UID the RFID reader reports while no card is present.
pub const RFID_NONE: &str = "00000000";

/// One polling response from the indicator.
///
/// Fixed offsets, mirroring [`RequestPacket`](crate::RequestPacket):
///
/// ```text
/// 0      STX
/// 1      device id digit
/// 2      command code letter
/// 3..11  RFID card UID (8 chars, "00000000" = no card)
/// 11     operator input class
/// 12..18 operator input text (6 chars)
/// 18..20 relay flags, ASCII-nibble pair
/// 20..22 opaque input echo (2 chars)
/// 22..24 voice code on the speaker, two decimal digits
/// 24..27 inner temperature, signed decimal
/// 27..29 fan trigger temperature
/// 29..31 heater trigger temperature
/// 31     printer status digit
/// 32..36 reserved
/// 36..38 "ST" when the weight is stable
/// 38..42 reserved
/// 42     weight sign
/// 43..50 weight magnitude, left-padded with spaces
/// 50..52 reserved
/// 52     ETX
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePacket {
    /// Responding device.
    pub device_id: u8,
    /// Echoed command selector.
    pub command_code: CommandCode,
    /// RFID card UID, [`RFID_NONE`] while the reader is empty.
    pub rfid_card_uid: String,
    /// Operator keypad input class.
    pub user_command_code: InputCode,
    /// Operator keypad input text.
    pub user_input: String,
    /// Green lamp relay state.
    pub green_blink: bool,
    /// Red lamp relay state.
    pub red_blink: bool,
    /// Fan relay state.
    pub fan_on: bool,
    /// Heater relay state.
    pub heater_on: bool,
    /// Undocumented two-character field, passed through untouched.
    pub unknown_input: String,
    /// Announcement currently on the speaker.
    pub voice_code: VoiceCode,
    /// Temperature inside the cabinet, degrees Celsius.
    pub inner_temperature: i32,
    /// Fan activation threshold, degrees Celsius.
    pub fan_trigger_temp: u8,
    /// Heater activation threshold, degrees Celsius.
    pub heater_trigger_temp: u8,
    /// Printer state.
    pub printer_status: PrinterStatus,
    /// True while the load cell reading is settled.
    pub is_weight_stable: bool,
    /// Current weight, integer kilograms.
    pub current_weight: i32,
}

impl ResponsePacket {
    /// Parse a complete wire frame.
    ///
    /// # Errors
    ///
    /// `MalformedFrame` for length/delimiter/alphabet violations,
    /// `UnknownEnum` and `NumericParse` for field-level rejects. Partial
    /// reads handed over by a timed-out serial link land here as length
    /// errors.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() != RESPONSE_LEN {
            return Err(ProtocolError::malformed(format!(
                "expected {RESPONSE_LEN} bytes, got {}",
                raw.len()
            )));
        }
        if raw[0] != STX || raw[RESPONSE_LEN - 1] != ETX {
            return Err(ProtocolError::malformed("missing STX/ETX delimiters"));
        }
        // ASCII-only guarantees every fixed offset is a char boundary.
        if !raw.is_ascii() {
            return Err(ProtocolError::malformed("frame is not ASCII text"));
        }
        let text = std::str::from_utf8(raw)
            .map_err(|_| ProtocolError::malformed("frame is not ASCII text"))?;

        let relay = RelayFlags::from_bits(decode_relay([raw[18], raw[19]])?);

        // Reserved bits 2 and 5..=7 are decoded above but intentionally
        // not surfaced.
        Ok(Self {
            device_id: parse_number(&text[1..2], "device_id")?,
            command_code: CommandCode::from_wire(raw[2])?,
            rfid_card_uid: text[3..11].to_string(),
            user_command_code: InputCode::from_wire(raw[11])?,
            user_input: text[12..18].to_string(),
            green_blink: relay.green(),
            red_blink: relay.red(),
            fan_on: relay.fan(),
            heater_on: relay.heater(),
            unknown_input: text[20..22].to_string(),
            voice_code: VoiceCode::from_wire(parse_number(&text[22..24], "voice_code")?)?,
            inner_temperature: parse_number(&text[24..27], "inner_temperature")?,
            fan_trigger_temp: parse_number(&text[27..29], "fan_trigger_temp")?,
            heater_trigger_temp: parse_number(&text[29..31], "heater_trigger_temp")?,
            printer_status: PrinterStatus::from_wire(parse_number(
                &text[31..32],
                "printer_status",
            )?)?,
            is_weight_stable: &raw[36..38] == b"ST",
            current_weight: parse_weight(text)?,
        })
    }

    /// True when a card is on the reader.
    pub fn has_rfid_card(&self) -> bool {
        self.rfid_card_uid != RFID_NONE
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, field: &'static str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| ProtocolError::NumericParse { field, text: text.to_string() })
}

/// Sign character plus the left-trimmed seven-digit magnitude.
fn parse_weight(text: &str) -> Result<i32> {
    let combined = format!("{}{}", &text[42..43], text[43..50].trim_start());
    combined
        .parse()
        .map_err(|_| ProtocolError::NumericParse { field: "current_weight", text: combined })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a valid 53-byte frame from its field slices.
    fn frame(
        rfid: &str,
        relay: &str,
        voice: &str,
        stability: &str,
        sign: char,
        magnitude: &str,
    ) -> Vec<u8> {
        let mut raw = Vec::with_capacity(RESPONSE_LEN);
        raw.push(STX);
        raw.extend_from_slice(b"0D");
        raw.extend_from_slice(rfid.as_bytes());
        raw.push(b'0');
        raw.extend_from_slice(b"000000");
        raw.extend_from_slice(relay.as_bytes());
        raw.extend_from_slice(b"00");
        raw.extend_from_slice(voice.as_bytes());
        raw.extend_from_slice(b" 25");
        raw.extend_from_slice(b"30");
        raw.extend_from_slice(b"05");
        raw.push(b'0');
        raw.extend_from_slice(b"    ");
        raw.extend_from_slice(stability.as_bytes());
        raw.extend_from_slice(b"    ");
        raw.push(sign as u8);
        raw.extend_from_slice(magnitude.as_bytes());
        raw.extend_from_slice(b"  ");
        raw.push(ETX);
        assert_eq!(raw.len(), RESPONSE_LEN);
        raw
    }

    #[test]
    fn stable_weighing_frame_parses() {
        let raw = frame("A1B2C3D4", "10", "00", "ST", '+', "    412");
        let packet = ResponsePacket::decode(&raw).unwrap();

        assert_eq!(packet.current_weight, 412);
        assert!(packet.is_weight_stable);
        assert!(packet.heater_on);
        assert!(!packet.green_blink && !packet.red_blink && !packet.fan_on);
        assert_eq!(packet.rfid_card_uid, "A1B2C3D4");
        assert!(packet.has_rfid_card());
        assert_eq!(packet.inner_temperature, 25);
        assert_eq!(packet.fan_trigger_temp, 30);
        assert_eq!(packet.heater_trigger_temp, 5);
        assert_eq!(packet.printer_status, PrinterStatus::Normal);
    }

    #[test]
    fn sentinel_uid_means_no_card() {
        let raw = frame(RFID_NONE, "00", "00", "  ", '+', "      0");
        let packet = ResponsePacket::decode(&raw).unwrap();
        assert!(!packet.has_rfid_card());
        assert!(!packet.is_weight_stable);
        assert_eq!(packet.current_weight, 0);
    }

    #[test]
    fn negative_weight_parses() {
        let raw = frame(RFID_NONE, "00", "00", "ST", '-', "     40");
        assert_eq!(ResponsePacket::decode(&raw).unwrap().current_weight, -40);
    }

    #[test]
    fn active_speaker_is_reported() {
        let raw = frame(RFID_NONE, "00", "03", "  ", '+', "      0");
        assert_eq!(ResponsePacket::decode(&raw).unwrap().voice_code, VoiceCode::PleaseWait);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = ResponsePacket::decode(b"\x02short\x03").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame { .. }));
    }

    #[test]
    fn missing_delimiters_are_rejected() {
        let mut raw = frame(RFID_NONE, "00", "00", "  ", '+', "      0");
        raw[0] = b'X';
        assert!(matches!(
            ResponsePacket::decode(&raw),
            Err(ProtocolError::MalformedFrame { .. })
        ));

        let mut raw = frame(RFID_NONE, "00", "00", "  ", '+', "      0");
        raw[52] = b'X';
        assert!(matches!(
            ResponsePacket::decode(&raw),
            Err(ProtocolError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn hex_relay_bytes_are_rejected() {
        let raw = frame(RFID_NONE, "1F", "00", "  ", '+', "      0");
        assert!(matches!(
            ResponsePacket::decode(&raw),
            Err(ProtocolError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn out_of_range_voice_code_is_rejected() {
        let raw = frame(RFID_NONE, "00", "13", "  ", '+', "      0");
        assert!(matches!(
            ResponsePacket::decode(&raw),
            Err(ProtocolError::UnknownEnum { field: "voice_code", .. })
        ));
    }

    #[test]
    fn blank_weight_is_a_numeric_error() {
        let raw = frame(RFID_NONE, "00", "00", "  ", '+', "       ");
        assert!(matches!(
            ResponsePacket::decode(&raw),
            Err(ProtocolError::NumericParse { field: "current_weight", .. })
        ));
    }

    #[test]
    fn decode_is_idempotent_on_identical_bytes() {
        let raw = frame("DEADBEEF", "09", "01", "ST", '+', "  33999");
        let first = ResponsePacket::decode(&raw).unwrap();
        let second = ResponsePacket::decode(&raw).unwrap();
        assert_eq!(first, second);
    }
}
