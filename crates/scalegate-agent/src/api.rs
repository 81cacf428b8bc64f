//! HTTP client for the backend's gateway API.
//!
//! Thin wrapper over reqwest with the backend's path layout baked in.
//! Status handling is explicit rather than `error_for_status`: the agent
//! needs to tell an authentication rejection (401/403/404, credentials are
//! gone) apart from a server-side failure (5xx, retry later) and from a
//! transport fault (network down, keep local cache).

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::store::GatewayRecord;

/// Client-side timeout on every request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from backend API calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("api returned status {status}")]
    Status {
        /// The response status.
        status: StatusCode,
    },

    /// The request never completed (DNS, connect, timeout, ...).
    #[error("api transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured base URL is unusable.
    #[error("invalid base url: {0}")]
    BaseUrl(String),
}

impl ApiError {
    /// True when the backend no longer recognizes our credentials.
    ///
    /// 404 counts: the backend deletes gateway resources it revokes, so a
    /// missing resource on an authenticated path means the same thing as
    /// an explicit rejection.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Status { status } if matches!(status.as_u16(), 401 | 403 | 404)
        )
    }

    /// True when the request never reached the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Registration body for `POST devices/api/gateways/`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GatewayRegistration {
    /// Canonical MAC address.
    pub mac_address: String,
    /// Host name to register under.
    pub hostname: String,
    /// Current IP address.
    pub ip_address: String,
    /// Display name.
    pub name: String,
}

/// Backend API client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for the given base URL (scheme + authority).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/');
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { http, base_url: base_url.to_string() })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a gateway by MAC address (unauthenticated bootstrap variant).
    pub async fn retrieve_gateway(&self, mac_address: &str) -> Result<GatewayRecord, ApiError> {
        let url = format!("{}/devices/api/gateways/{mac_address}/", self.base_url);
        let response = self.http.get(url).send().await?;
        Self::expect_success(response.status())?;
        Ok(response.json().await?)
    }

    /// Fetch our own gateway record using the access token.
    pub async fn retrieve_gateway_self(&self, token: &str) -> Result<GatewayRecord, ApiError> {
        let url = format!("{}/devices/api/gateways/self/", self.base_url);
        let response = self.http.get(url).bearer_auth(token).send().await?;
        Self::expect_success(response.status())?;
        Ok(response.json().await?)
    }

    /// Register a new gateway.
    pub async fn register_gateway(
        &self,
        registration: &GatewayRegistration,
    ) -> Result<GatewayRecord, ApiError> {
        let url = format!("{}/devices/api/gateways/", self.base_url);
        let response = self.http.post(url).json(registration).send().await?;
        Self::expect_success(response.status())?;
        Ok(response.json().await?)
    }

    /// Report liveness using the access token.
    pub async fn send_heartbeat(&self, token: &str) -> Result<(), ApiError> {
        let url = format!("{}/devices/api/gateways/heartbeat/", self.base_url);
        let response = self.http.post(url).bearer_auth(token).send().await?;
        Self::expect_success(response.status())
    }

    fn expect_success(status: StatusCode) -> Result<(), ApiError> {
        if status.is_success() { Ok(()) } else { Err(ApiError::Status { status }) }
    }
}
