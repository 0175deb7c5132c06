use duet_core::{ConnectionId, RoomId};
use thiserror::Error;

/// Rejections from the room router. Logged by the caller, never sent to the peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("connection {0} is not registered or already closing")]
    UnknownConnection(ConnectionId),

    #[error("connection {conn} is not a member of room '{room}'")]
    NotInRoom { conn: ConnectionId, room: RoomId },
}
