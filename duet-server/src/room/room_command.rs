use duet_core::{ClientEnvelope, ConnectionId, RoomId};
use serde_json::Value;

/// Membership and relay requests coming from a connection's reader task.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        conn: ConnectionId,
        room: RoomId,
    },

    /// Opaque payload to fan out to the other members of `room`.
    Signal {
        conn: ConnectionId,
        room: RoomId,
        payload: Value,
    },

    Leave {
        conn: ConnectionId,
        room: RoomId,
    },

    /// The channel closed without an explicit leave.
    Disconnect { conn: ConnectionId },
}

impl RoomCommand {
    pub fn from_envelope(conn: ConnectionId, envelope: ClientEnvelope) -> Self {
        match envelope {
            ClientEnvelope::Join { room } => Self::Join { conn, room },
            ClientEnvelope::Signal { room, payload } => Self::Signal {
                conn,
                room,
                payload,
            },
            ClientEnvelope::Leave { room } => Self::Leave { conn, room },
        }
    }
}
