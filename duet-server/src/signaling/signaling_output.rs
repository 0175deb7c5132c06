use duet_core::{ConnectionId, ServerEnvelope};

/// Outbound side of the relay: how the router reaches a connection.
///
/// Called while a room's membership is locked, so implementations must
/// enqueue and return without awaiting.
pub trait SignalingOutput: Send + Sync {
    fn deliver(&self, conn: &ConnectionId, envelope: &ServerEnvelope);
}
