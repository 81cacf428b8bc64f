//! Gateway lifecycle state machine.
//!
//! The outer loop evaluates three phases in order on every iteration:
//! bootstrap (adopt cached credentials, sync the record), provisioning
//! (websocket identify/registered exchange) while no token is held, and
//! the active session (command listener + heartbeat) once one is.
//!
//! Error routing follows the taxonomy: an authentication rejection on any
//! authenticated call raises [`AgentError::AuthDegraded`], which wipes the
//! local credentials and sends the loop back to provisioning; every other
//! failure is logged and retried after a fixed back-off. Nothing escapes
//! the outer loop except task cancellation.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

use crate::{
    api::ApiClient,
    host::{HostIdentity, scan_peripherals},
    messages::{InboundFrame, OutboundFrame},
    store::{GatewayRecord, GatewayStore},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Failures of one lifecycle phase.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The backend rejected our credentials on an authenticated call.
    #[error("backend no longer recognizes this gateway")]
    AuthDegraded,

    /// A token is held but the remote sync has not yielded an id yet, so
    /// the active socket path cannot be formed.
    #[error("gateway id unknown; remote sync has not completed")]
    MissingGatewayId,

    /// Websocket connect/read/write failure, including normal closure.
    #[error("websocket: {0}")]
    Socket(String),

    /// An outbound frame could not be serialized.
    #[error("frame encoding: {0}")]
    Encoding(String),
}

fn socket_err(err: tokio_tungstenite::tungstenite::Error) -> AgentError {
    AgentError::Socket(err.to_string())
}

/// Swap an HTTP base URL's scheme for the websocket equivalent.
pub fn websocket_base(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    }
}

/// Lifecycle tunables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Pause between heartbeats in the active session.
    pub heartbeat_interval: Duration,
    /// Back-off after a failed loop iteration.
    pub retry_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            retry_interval: Duration::from_secs(5),
        }
    }
}

/// The gateway's identity lifecycle against the backend.
pub struct GatewayAgent {
    api: ApiClient,
    store: GatewayStore,
    identity: HostIdentity,
    config: AgentConfig,
    ws_base: String,
    access_token: Option<String>,
    gateway_id: Option<i64>,
}

impl GatewayAgent {
    /// Create an agent; no I/O happens until [`run`](Self::run).
    pub fn new(
        api: ApiClient,
        store: GatewayStore,
        identity: HostIdentity,
        config: AgentConfig,
    ) -> Self {
        let ws_base = websocket_base(api.base_url());
        Self { api, store, identity, config, ws_base, access_token: None, gateway_id: None }
    }

    /// The token currently held, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The backend-assigned gateway id, if known.
    pub fn gateway_id(&self) -> Option<i64> {
        self.gateway_id
    }

    /// Run the lifecycle until the task is cancelled.
    pub async fn run(&mut self) {
        loop {
            self.bootstrap().await;

            let outcome = if self.access_token.is_none() {
                self.run_provisioning().await
            } else {
                self.run_active().await
            };

            match outcome {
                Ok(()) => {},
                Err(AgentError::AuthDegraded) => {
                    tracing::warn!("authentication degraded");
                    self.wipe_local_auth();
                },
                Err(err) => {
                    tracing::warn!(%err, retry_in = ?self.config.retry_interval, "lifecycle error");
                    tokio::time::sleep(self.config.retry_interval).await;
                },
            }
        }
    }

    /// Adopt cached credentials and sync the gateway record.
    ///
    /// Running this twice against the same backend response leaves one
    /// stored row and an unchanged token.
    pub async fn bootstrap(&mut self) {
        tracing::debug!("evaluating bootstrap state");

        if self.access_token.is_none() {
            match self.store.get(&self.identity.mac_address) {
                Ok(Some(record)) => {
                    // An empty token in the row counts as unprovisioned.
                    self.access_token =
                        record.access_token.clone().filter(|token| !token.is_empty());
                    self.gateway_id = record.id;
                    if self.access_token.is_some() {
                        tracing::info!(gateway_id = ?self.gateway_id, "adopted cached credentials");
                    }
                },
                Ok(None) => {},
                Err(err) => tracing::error!(%err, "cannot read the gateway store"),
            }
        }

        let Some(token) = self.access_token.clone() else {
            tracing::info!("no credentials held, provisioning required");
            return;
        };

        tracing::info!("syncing gateway record from the backend");
        match self.api.retrieve_gateway_self(&token).await {
            Ok(remote) => {
                // The backend-assigned id is authoritative; the row stays
                // keyed by our own MAC.
                let record =
                    GatewayRecord { mac_address: self.identity.mac_address.clone(), ..remote };
                if let Err(err) = self.store.upsert(&record) {
                    tracing::error!(%err, "failed to persist the gateway record");
                }
                self.gateway_id = record.id;
                if let Some(remote_token) =
                    record.access_token.filter(|token| !token.is_empty())
                {
                    self.access_token = Some(remote_token);
                }
                tracing::info!(gateway_id = ?self.gateway_id, "gateway record synced");
            },
            Err(err) if err.is_auth_rejected() => {
                tracing::warn!(%err, "backend rejected cached credentials");
                self.wipe_local_auth();
            },
            Err(err) if err.is_transport() => {
                tracing::warn!(%err, "backend unreachable, keeping the local cache");
            },
            Err(err) => {
                tracing::error!(%err, "gateway sync failed");
            },
        }
    }

    fn wipe_local_auth(&mut self) {
        tracing::warn!("wiping local gateway credentials");
        if let Err(err) = self.store.wipe() {
            tracing::error!(%err, "failed to wipe the gateway store");
        }
        self.access_token = None;
        self.gateway_id = None;
    }

    /// Hold the provisioning socket until the backend hands over a token.
    async fn run_provisioning(&mut self) -> Result<(), AgentError> {
        let url = format!("{}/ws/devices/gateways/provisioning/", self.ws_base);
        tracing::info!(%url, "connecting provisioning socket");
        let (mut ws, _) = connect_async(&url).await.map_err(socket_err)?;
        tracing::info!("provisioning socket connected");

        while let Some(message) = ws.next().await {
            let message = message.map_err(socket_err)?;
            if let Message::Text(text) = message {
                self.dispatch_provisioning(&mut ws, text.as_str()).await?;
            }

            if self.access_token.is_some() {
                tracing::info!("provisioning handover ready");
                return Ok(());
            }
        }

        Err(AgentError::Socket("provisioning socket closed before registration".to_string()))
    }

    async fn dispatch_provisioning(
        &mut self,
        ws: &mut WsStream,
        text: &str,
    ) -> Result<(), AgentError> {
        match serde_json::from_str::<InboundFrame>(text) {
            Ok(InboundFrame::Identify) => {
                tracing::info!("identify challenge received");
                let reply = OutboundFrame::Identity(self.identity.clone());
                ws.send(Message::text(encode_frame(&reply)?)).await.map_err(socket_err)?;
            },
            Ok(InboundFrame::GatewayRegistered { access_token }) => {
                tracing::info!("registration received");
                if access_token.is_empty() {
                    tracing::warn!("registration carried an empty token, ignoring");
                } else {
                    self.access_token = Some(access_token);
                }
            },
            Ok(other) => tracing::warn!(?other, "frame out of place during provisioning"),
            Err(_) => log_unhandled(text),
        }
        Ok(())
    }

    /// Run the authenticated session: command listener plus heartbeat,
    /// two fibers in one scope. The first failure (including
    /// `AuthDegraded`) cancels the other and tears the session down.
    async fn run_active(&mut self) -> Result<(), AgentError> {
        let Some(gateway_id) = self.gateway_id else {
            return Err(AgentError::MissingGatewayId);
        };
        let Some(token) = self.access_token.clone() else {
            return Err(AgentError::MissingGatewayId);
        };

        let url = format!("{}/ws/devices/gateways/{gateway_id}/", self.ws_base);
        tracing::info!(%url, "connecting active socket");
        let (mut ws, _) = connect_async(&url).await.map_err(socket_err)?;
        tracing::info!("active socket connected");

        // Both fibers observe the same token snapshot; nothing in the
        // active session rewrites it.
        tokio::try_join!(self.listen_active(&mut ws), self.heartbeat_loop(&token))?;
        Ok(())
    }

    async fn listen_active(&self, ws: &mut WsStream) -> Result<(), AgentError> {
        while let Some(message) = ws.next().await {
            let message = message.map_err(socket_err)?;
            let Message::Text(text) = message else { continue };

            match serde_json::from_str::<InboundFrame>(text.as_str()) {
                Ok(InboundFrame::ScanPeripherals) => {
                    tracing::info!("peripheral scan requested");
                    let ports = scan_peripherals();
                    let count = ports.len();
                    let reply = OutboundFrame::PeripheralsScanned(ports);
                    ws.send(Message::text(encode_frame(&reply)?)).await.map_err(socket_err)?;
                    tracing::info!(count, "peripheral scan completed");
                },
                Ok(other) => tracing::debug!(?other, "frame out of place during active session"),
                Err(_) => log_unhandled(text.as_str()),
            }
        }

        Err(AgentError::Socket("active socket closed".to_string()))
    }

    async fn heartbeat_loop(&self, token: &str) -> Result<(), AgentError> {
        loop {
            tracing::debug!("sending heartbeat");
            match self.api.send_heartbeat(token).await {
                Ok(()) => tracing::debug!("heartbeat acknowledged"),
                Err(err) if err.is_auth_rejected() => {
                    tracing::error!(%err, "heartbeat rejected");
                    return Err(AgentError::AuthDegraded);
                },
                Err(err) => tracing::warn!(%err, "heartbeat failed"),
            }
            tokio::time::sleep(self.config.heartbeat_interval).await;
        }
    }
}

fn encode_frame(frame: &OutboundFrame) -> Result<String, AgentError> {
    serde_json::to_string(frame).map_err(|err| AgentError::Encoding(err.to_string()))
}

/// Unknown frame types are ignored; invalid JSON is only worth an error
/// log. Neither may bring a session down.
fn log_unhandled(text: &str) {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            tracing::warn!(frame_type = ?value.get("type"), "ignoring unhandled frame");
        },
        Err(err) => tracing::error!(%err, "invalid json frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_base_swaps_schemes() {
        assert_eq!(websocket_base("http://localhost:8000"), "ws://localhost:8000");
        assert_eq!(websocket_base("https://backend.example"), "wss://backend.example");
    }

    #[test]
    fn auth_degraded_formats_without_leaking_tokens() {
        let message = AgentError::AuthDegraded.to_string();
        assert!(message.contains("no longer recognizes"));
    }
}
