//! Gateway lifecycle agent.
//!
//! Keeps one field gateway provisioned against the central backend and
//! holds the authenticated session open. The lifecycle is an outer loop
//! over three phases:
//!
//! 1. **Bootstrap** — adopt cached credentials from the local store, then
//!    sync the gateway record from the backend.
//! 2. **Provisioning** — while unprovisioned, hold a websocket open and
//!    answer the backend's `identify` challenge until it hands over an
//!    access token.
//! 3. **Active session** — a long-lived websocket (command channel) plus a
//!    periodic HTTP heartbeat, run as two fibers in one scope. An
//!    authentication rejection anywhere tears the scope down, wipes the
//!    local credentials and starts over at provisioning.
//!
//! The weighing-station workers (see `scalegate-station`) run on their own
//! threads; their events reach async consumers over a broadcast channel
//! and never pass through this state machine.

mod agent;
mod api;
mod host;
mod messages;
mod store;

pub use agent::{AgentConfig, AgentError, GatewayAgent, websocket_base};
pub use api::{ApiClient, ApiError, GatewayRegistration};
pub use host::{HostIdentity, PortInfo, scan_peripherals};
pub use messages::{InboundFrame, OutboundFrame};
pub use store::{GatewayRecord, GatewayStore, StoreError};
