//! Weighing-station worker for Suwol1000 indicators.
//!
//! One [`WeighingWorker`] owns one serial port and runs on a dedicated OS
//! thread with blocking I/O: it polls the indicator at a fixed cadence,
//! turns raw frames into domain events (card tagged, weighing completed),
//! walks the voice-announcement sequence after a card is seen, and reopens
//! the port after link faults.
//!
//! Events cross into async consumers through [`EventSink`]; the production
//! sink is a bounded broadcast channel that never blocks the worker and
//! drops the oldest events on overflow.

mod event;
mod link;
mod worker;

pub use event::{
    ChannelSink, EVENT_CHANNEL_CAPACITY, EventKind, EventSink, NullSink, StationEvent,
};
pub use link::{IndicatorLink, LinkError, PortOpener, SerialLink, SerialPortOpener};
pub use worker::{StopFlag, WeighingWorker, WorkerConfig, WorkerState};
