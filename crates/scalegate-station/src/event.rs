//! Domain events emitted by the weighing worker.
//!
//! Events are immutable and stamped with a fresh UUID and a local
//! timestamp at creation. Delivery is fire-and-forget from the worker's
//! point of view: the production sink is a bounded broadcast channel whose
//! send never blocks, and a consumer that falls behind loses the oldest
//! events (it observes the loss as a `Lagged` error and should log it).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bound on in-flight events per worker; oldest are dropped on overflow.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What happened at the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A card was presented to the RFID reader.
    RfidTagged {
        /// UID read from the card.
        rfid_card_uid: String,
    },

    /// The announcement sequence for a weighing ran to completion.
    WeighingCompleted {
        /// UID of the card that opened the weighing.
        rfid_card_uid: String,
        /// Final weight, integer kilograms.
        weight: i32,
    },
}

/// One station event with identity and creation time.
#[derive(Debug, Clone)]
pub struct StationEvent {
    /// Unique id for downstream dedup and tracing.
    pub id: Uuid,
    /// Local creation time.
    pub timestamp: DateTime<Utc>,
    /// The event itself.
    pub kind: EventKind,
}

impl StationEvent {
    fn new(kind: EventKind) -> Self {
        Self { id: Uuid::new_v4(), timestamp: Utc::now(), kind }
    }

    /// A card was presented.
    pub fn rfid_tagged(rfid_card_uid: impl Into<String>) -> Self {
        Self::new(EventKind::RfidTagged { rfid_card_uid: rfid_card_uid.into() })
    }

    /// A weighing ran to completion.
    pub fn weighing_completed(rfid_card_uid: impl Into<String>, weight: i32) -> Self {
        Self::new(EventKind::WeighingCompleted { rfid_card_uid: rfid_card_uid.into(), weight })
    }
}

/// Consumer seam for worker events. Implementations must not block.
pub trait EventSink: Send {
    /// Deliver one event.
    fn emit(&self, event: StationEvent);
}

/// Production sink over a bounded `tokio` broadcast channel.
///
/// `broadcast` gives exactly the overflow policy the worker needs: send
/// never blocks, a slow consumer loses the oldest values first, and a
/// missing consumer degrades to discarding events entirely.
#[derive(Clone)]
pub struct ChannelSink {
    tx: tokio::sync::broadcast::Sender<StationEvent>,
}

impl ChannelSink {
    /// Create the sink and its first consumer handle.
    pub fn new() -> (Self, tokio::sync::broadcast::Receiver<StationEvent>) {
        let (tx, rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    /// Attach another consumer.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StationEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: StationEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("station event discarded: no consumer attached");
        }
    }
}

/// Sink for deployments without a consumer; events are logged and dropped.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, event: StationEvent) {
        tracing::debug!(?event.kind, "station event discarded");
    }
}
