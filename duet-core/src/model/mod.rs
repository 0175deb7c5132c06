mod connection;
mod envelope;
mod payload;
mod room;

pub use connection::{ConnectionId, Liveness};
pub use envelope::{ClientEnvelope, IceServerConfig, ServerEnvelope};
pub use payload::{IceCandidate, SdpType, SessionDescription, SignalPayload};
pub use room::RoomId;
