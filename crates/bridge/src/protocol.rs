//! Wire format between the native host and the embedded map renderer.
//!
//! Frames are JSON text messages tagged by `type`:
//! - Host → renderer: session hello, then one `command` frame per script
//!   statement, in dispatch order.
//! - Renderer → host: `ready` once the map and the callable bridge surface
//!   exist, `waypoint_added` per secondary-click, and `applied` when
//!   acknowledgments are switched on.

use serde::{Deserialize, Serialize};

/// Message from host to renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// First frame of every session.
    Hello {
        session_id: String,
        server_version: String,
    },

    /// One script statement to evaluate. `seq` increases by one per dispatch.
    Command { seq: u64, script: String },
}

/// Message from renderer to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendererMessage {
    /// Initialization handshake finished; the renderer now accepts commands
    /// and may report interactions.
    Ready,

    /// The user dropped a waypoint on the map surface.
    WaypointAdded { lat: f64, lng: f64 },

    /// Optional acknowledgment that command `seq` was evaluated.
    Applied { seq: u64 },
}

#[derive(Debug)]
pub enum ProtocolError {
    Decode(serde_json::Error),
    Encode(serde_json::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Decode(e) => write!(f, "malformed renderer frame: {e}"),
            ProtocolError::Encode(e) => write!(f, "failed to encode host frame: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl HostMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

impl RendererMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
