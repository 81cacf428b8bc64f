//! Serial link to the indicator.
//!
//! [`SerialLink`] owns one port for the lifetime of a connection and frames
//! reads by scanning to ETX under a bounded timeout. The two failure
//! classes matter to the worker and are kept distinct: [`LinkError::Timeout`]
//! is transient (the indicator was slow, stay connected) while
//! [`LinkError::LinkLost`] means the port is gone and must be reopened.
//!
//! [`IndicatorLink`] and [`PortOpener`] are the seams the worker is generic
//! over; tests script them without hardware.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use scalegate_proto::{ETX, RESPONSE_LEN};
use thiserror::Error;

/// Fixed line rate of the Suwol1000 indicator (8N1).
const BAUD_RATE: u32 = 9600;

/// Bounded wait for a single read before giving up on the frame.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on one frame scan. A babbling device that never sends ETX
/// must not grow the buffer without limit; the codec rejects the excess.
const MAX_FRAME_SCAN: usize = 4 * RESPONSE_LEN;

/// Errors surfaced by a serial link.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The read window elapsed with no data at all.
    #[error("serial read timed out with no data")]
    Timeout,

    /// The port failed in a way that requires reopening it.
    #[error("serial link lost: {0}")]
    LinkLost(String),
}

impl LinkError {
    /// True for the transient class; the caller stays connected.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::LinkLost(err.to_string()),
        }
    }
}

/// Byte-level transport to one indicator.
pub trait IndicatorLink: Send {
    /// Write one complete frame.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), LinkError>;

    /// Read until and including ETX.
    ///
    /// On timeout with partial data the partial frame is returned for the
    /// codec to reject; on timeout with no data, fails with
    /// [`LinkError::Timeout`].
    fn read_frame(&mut self) -> Result<Vec<u8>, LinkError>;

    /// Discard any buffered input.
    fn reset_input(&mut self) -> Result<(), LinkError>;
}

/// Opens a fresh link; the worker re-invokes this after link loss.
pub trait PortOpener: Send {
    /// The link type produced.
    type Link: IndicatorLink;

    /// Open the port.
    fn open(&self) -> Result<Self::Link, LinkError>;
}

/// Production serial link over a system port.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
    /// Open a named port at the indicator's fixed settings.
    pub fn open(port_name: &str) -> Result<Self, LinkError> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| LinkError::LinkLost(e.to_string()))?;
        Ok(Self { port })
    }
}

impl IndicatorLink for SerialLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(frame).map_err(|e| LinkError::from_io(&e))?;
        self.port.flush().map_err(|e| LinkError::from_io(&e))
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut frame = Vec::with_capacity(RESPONSE_LEN);
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => return Err(LinkError::LinkLost("port closed mid-read".to_string())),
                Ok(_) => {
                    frame.push(byte[0]);
                    if byte[0] == ETX || frame.len() >= MAX_FRAME_SCAN {
                        return Ok(frame);
                    }
                },
                Err(err) if LinkError::from_io(&err).is_timeout() => {
                    if frame.is_empty() {
                        return Err(LinkError::Timeout);
                    }
                    return Ok(frame);
                },
                Err(err) => return Err(LinkError::LinkLost(err.to_string())),
            }
        }
    }

    fn reset_input(&mut self) -> Result<(), LinkError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| LinkError::LinkLost(e.to_string()))
    }
}

/// [`PortOpener`] for a named system serial port.
pub struct SerialPortOpener {
    port_name: String,
}

impl SerialPortOpener {
    /// Opener for the given port name (`/dev/ttyUSB0`, `COM3`, ...).
    pub fn new(port_name: impl Into<String>) -> Self {
        Self { port_name: port_name.into() }
    }

    /// The configured port name.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl PortOpener for SerialPortOpener {
    type Link = SerialLink;

    fn open(&self) -> Result<SerialLink, LinkError> {
        SerialLink::open(&self.port_name)
    }
}
