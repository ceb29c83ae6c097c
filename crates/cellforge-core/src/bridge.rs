//! Outbound signal interface to an external collaborator.
//!
//! The core sends one JSON payload per call and may or may not get a reply.
//! A `None` reply means the collaborator is unavailable; callers carry on
//! without it. Implementations that talk to a network must bound their own
//! waits.

use serde::Serialize;
use tracing::{debug, info};

/// Counts from one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    /// Payloads handed to the bridge.
    pub sent: usize,
    /// Payloads that got a response.
    pub acknowledged: usize,
    /// Payloads that got no response or could not be encoded.
    pub unavailable: usize,
}

/// A synchronous, best-effort signal channel.
pub trait SignalBridge: std::fmt::Debug {
    /// Send `payload`. `None` means no response is available.
    fn send_signal(&mut self, payload: &serde_json::Value) -> Option<String>;
}

/// A bridge with nothing on the other end.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBridge;

impl SignalBridge for OfflineBridge {
    fn send_signal(&mut self, _payload: &serde_json::Value) -> Option<String> {
        None
    }
}

/// An in-process bridge that records payloads and acknowledges them while
/// connected.
#[derive(Debug, Clone, Default)]
pub struct LoopbackBridge {
    connected: bool,
    received: Vec<serde_json::Value>,
}

impl LoopbackBridge {
    /// A disconnected bridge.
    pub const fn new() -> Self {
        Self {
            connected: false,
            received: Vec::new(),
        }
    }

    /// Open the connection.
    pub fn connect(&mut self) {
        self.connected = true;
        info!("Loopback bridge connected");
    }

    /// Close the connection. Later signals go unanswered.
    pub fn disconnect(&mut self) {
        self.connected = false;
        info!("Loopback bridge disconnected");
    }

    /// Whether the bridge is connected.
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Payloads accepted while connected, oldest first.
    pub fn received(&self) -> &[serde_json::Value] {
        &self.received
    }
}

impl SignalBridge for LoopbackBridge {
    fn send_signal(&mut self, payload: &serde_json::Value) -> Option<String> {
        if !self.connected {
            debug!("Loopback bridge offline, signal dropped");
            return None;
        }
        self.received.push(payload.clone());
        let subject = payload
            .get("entity_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        Some(format!("ack {subject}"))
    }
}
