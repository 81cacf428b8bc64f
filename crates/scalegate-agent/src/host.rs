//! Host identity and peripheral enumeration.
//!
//! Everything here degrades gracefully: a host without a resolvable MAC,
//! IP or hostname still produces a usable identity (zeros, loopback,
//! `"unknown"`) so the agent can reach provisioning and let an operator
//! sort out the rest.

use serde::{Deserialize, Serialize};

/// The identity this gateway reports to the backend.
///
/// Captured once at startup; the serialized form doubles as the payload
/// of the `identity` websocket frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    /// Canonical lowercase MAC of the primary interface.
    pub mac_address: String,
    /// OS hostname.
    pub hostname: String,
    /// Outward-facing local IP address.
    pub ip_address: String,
}

impl HostIdentity {
    /// Snapshot the current host.
    pub fn detect() -> Self {
        Self {
            mac_address: primary_mac(),
            hostname: local_hostname(),
            ip_address: local_ip_address(),
        }
    }
}

/// One attached serial device, as reported to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// System port name (`/dev/ttyUSB0`, `COM3`, ...).
    pub port_name: String,
    /// Transport class: `usb`, `pci`, `bluetooth` or `unknown`.
    pub port_kind: String,
}

/// Enumerate serial ports currently attached to this host.
pub fn scan_peripherals() -> Vec<PortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|port| PortInfo {
                port_name: port.port_name,
                port_kind: match port.port_type {
                    serialport::SerialPortType::UsbPort(_) => "usb",
                    serialport::SerialPortType::PciPort => "pci",
                    serialport::SerialPortType::BluetoothPort => "bluetooth",
                    serialport::SerialPortType::Unknown => "unknown",
                }
                .to_string(),
            })
            .collect(),
        Err(err) => {
            tracing::warn!(%err, "serial port enumeration failed");
            Vec::new()
        },
    }
}

/// MAC address of the primary interface, canonical lowercase colon form.
fn primary_mac() -> String {
    match mac_address::get_mac_address() {
        Ok(Some(mac)) => canonical_mac(mac.bytes()),
        Ok(None) => {
            tracing::warn!("no network interface with a MAC address found");
            canonical_mac([0; 6])
        },
        Err(err) => {
            tracing::warn!(%err, "MAC address lookup failed");
            canonical_mac([0; 6])
        },
    }
}

fn canonical_mac(bytes: [u8; 6]) -> String {
    let parts: Vec<String> = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    parts.join(":")
}

fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Outward-facing local IP, learned by routing a throwaway datagram
/// toward a public resolver. Nothing is actually sent.
fn local_ip_address() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|_| "127.0.0.1".to_string())
}
