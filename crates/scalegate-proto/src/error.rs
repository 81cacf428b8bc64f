//! Error types for the Suwol1000 codec.
//!
//! Decoding is the untrusted path: frames arrive from a serial line that
//! times out mid-frame and picks up electrical noise, so every reject
//! carries enough context to log the offending bytes. None of these errors
//! is fatal to a caller; the convention is to discard the frame and keep
//! polling.

use thiserror::Error;

/// Codec result alias.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding indicator frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame structure is wrong: bad length, missing STX/ETX, non-ASCII
    /// content, or a relay byte outside the nibble alphabet.
    #[error("malformed frame: {detail}")]
    MalformedFrame {
        /// What was wrong with the frame.
        detail: String,
    },

    /// A field held a value outside its enumeration.
    #[error("unknown {field} value: {value:?}")]
    UnknownEnum {
        /// Which field failed.
        field: &'static str,
        /// The offending wire value.
        value: String,
    },

    /// A numeric field did not parse as a decimal number.
    #[error("cannot parse {field} from {text:?}")]
    NumericParse {
        /// Which field failed.
        field: &'static str,
        /// The offending wire text.
        text: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedFrame { detail: detail.into() }
    }
}
