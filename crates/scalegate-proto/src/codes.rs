//! Wire enumerations shared by request and response frames.

use crate::error::{ProtocolError, Result};

/// Request command selector (byte 2 of both frame directions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandCode {
    /// Display and control: weight/plate display, relays, voice.
    #[default]
    Display,
    /// Printer output.
    Print,
    /// Temperature setpoint transfer.
    Temp,
}

impl CommandCode {
    /// ASCII letter sent on the wire.
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Display => b'D',
            Self::Print => b'P',
            Self::Temp => b'T',
        }
    }

    /// Parse the wire letter.
    pub fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            b'D' => Ok(Self::Display),
            b'P' => Ok(Self::Print),
            b'T' => Ok(Self::Temp),
            other => Err(ProtocolError::UnknownEnum {
                field: "command_code",
                value: (other as char).to_string(),
            }),
        }
    }
}

/// Voice announcement selector.
///
/// The indicator plays at most one announcement at a time and reports the
/// code currently on its speaker in every response; `None` means silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum VoiceCode {
    /// No announcement.
    #[default]
    None = 0,
    /// "Weighing is complete."
    WeightComplete = 1,
    /// "Please stand by."
    StandBy = 2,
    /// "Please wait a moment."
    PleaseWait = 3,
    /// "Please tag your card."
    TagCard = 4,
    /// "Indicator fault."
    IndicatorError = 5,
    /// "Overload."
    Overload = 6,
    /// "Please check with the administrator."
    CheckAdmin = 7,
    /// "Unregistered card."
    UnregisteredCard = 8,
    /// Plain warning beep.
    WarningBeep = 9,
    /// "System fault, please wait."
    SystemError = 10,
    /// "Thank you for using our service."
    ThankYou = 11,
    /// Alert chime.
    AlertSound = 12,
}

impl VoiceCode {
    /// Numeric wire value (encoded as two zero-padded decimal digits).
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    /// Parse the numeric wire value.
    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::WeightComplete),
            2 => Ok(Self::StandBy),
            3 => Ok(Self::PleaseWait),
            4 => Ok(Self::TagCard),
            5 => Ok(Self::IndicatorError),
            6 => Ok(Self::Overload),
            7 => Ok(Self::CheckAdmin),
            8 => Ok(Self::UnregisteredCard),
            9 => Ok(Self::WarningBeep),
            10 => Ok(Self::SystemError),
            11 => Ok(Self::ThankYou),
            12 => Ok(Self::AlertSound),
            other => Err(ProtocolError::UnknownEnum {
                field: "voice_code",
                value: other.to_string(),
            }),
        }
    }

    /// True when the speaker is idle.
    pub const fn is_silent(self) -> bool {
        matches!(self, Self::None)
    }
}

/// Operator keypad input class reported by the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputCode {
    /// No pending input.
    #[default]
    None,
    /// Vehicle number entry.
    VehicleNo,
    /// Customer code entry.
    CustomerCode,
    /// Product code entry.
    ProductCode,
    /// Slip reprint request.
    Reprint,
}

impl InputCode {
    /// ASCII wire character.
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::None => b'0',
            Self::VehicleNo => b'N',
            Self::CustomerCode => b'C',
            Self::ProductCode => b'M',
            Self::Reprint => b'P',
        }
    }

    /// Parse the wire character.
    pub fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            b'0' => Ok(Self::None),
            b'N' => Ok(Self::VehicleNo),
            b'C' => Ok(Self::CustomerCode),
            b'M' => Ok(Self::ProductCode),
            b'P' => Ok(Self::Reprint),
            other => Err(ProtocolError::UnknownEnum {
                field: "user_command_code",
                value: (other as char).to_string(),
            }),
        }
    }
}

/// Printer state reported by the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PrinterStatus {
    /// Ready.
    #[default]
    Normal = 0,
    /// Out of paper.
    NoPaper = 1,
    /// A print job is being transmitted.
    Transmitting = 2,
}

impl PrinterStatus {
    /// Parse the single-digit wire value.
    pub fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::NoPaper),
            2 => Ok(Self::Transmitting),
            other => Err(ProtocolError::UnknownEnum {
                field: "printer_status",
                value: other.to_string(),
            }),
        }
    }
}
