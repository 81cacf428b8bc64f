//! Websocket frame vocabulary for the backend sessions.
//!
//! Every frame is a UTF-8 JSON object with a `type` discriminator and an
//! optional `payload`. The same vocabulary serves both sockets: the
//! provisioning session uses `identify`/`identity`/`gateway.registered`,
//! the active session uses `scan.peripherals`/`peripherals.scanned`.
//! Frames with unknown types fail to parse here and are logged and
//! dropped by the dispatcher; they are never an error condition.

use serde::{Deserialize, Serialize};

use crate::host::{HostIdentity, PortInfo};

/// Frames the backend sends to the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum InboundFrame {
    /// Provisioning challenge: the backend wants to know who connected.
    #[serde(rename = "identify")]
    Identify,

    /// Provisioning handover carrying the newly issued access token.
    #[serde(rename = "gateway.registered")]
    GatewayRegistered {
        /// The issued bearer token.
        access_token: String,
    },

    /// Active-session command: enumerate attached serial peripherals.
    #[serde(rename = "scan.peripherals")]
    ScanPeripherals,
}

/// Frames the gateway sends to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum OutboundFrame {
    /// Reply to `identify`.
    #[serde(rename = "identity")]
    Identity(HostIdentity),

    /// Reply to `scan.peripherals`.
    #[serde(rename = "peripherals.scanned")]
    PeripheralsScanned(Vec<PortInfo>),
}
