use crate::error::CallError;
use async_trait::async_trait;
use duet_core::{ClientEnvelope, ServerEnvelope};
use tokio::sync::mpsc;

mod ws_channel;

pub use ws_channel::WsConnector;

#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Envelope(ServerEnvelope),
    /// The relay connection is gone. Sent once, after the last envelope.
    Closed,
}

/// Opens relay channels. Inbound traffic is pushed to `events` for as long as
/// the channel lives.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<SignalingEvent>,
    ) -> Result<Box<dyn SignalingChannel>, CallError>;
}

/// Outbound half of an open relay channel.
pub trait SignalingChannel: Send + Sync {
    fn is_open(&self) -> bool;

    /// Fails with [`CallError::ChannelNotOpen`] once the channel was closed
    /// locally or by the relay. Never buffers.
    fn send(&self, envelope: &ClientEnvelope) -> Result<(), CallError>;

    fn close(&self);
}
