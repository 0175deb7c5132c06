use crate::error::ProtocolError;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// STUN/TURN server handed to the negotiation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Frames a peer sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEnvelope {
    Join { room: RoomId },
    Signal { room: RoomId, payload: Value },
    Leave { room: RoomId },
}

impl ClientEnvelope {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> String {
        // Tagged enum of strings and a JSON value always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Frames the relay sends to a peer. The room is implied by the recipient's membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEnvelope {
    Signal {
        payload: Value,
    },
    Leave,
    /// Another connection joined the recipient's room.
    #[serde(rename = "peer-joined")]
    PeerJoined,
}

impl ServerEnvelope {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
