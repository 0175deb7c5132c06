use crate::error::CallError;
use crate::media::LocalMedia;
use crate::state::Connectivity;
use async_trait::async_trait;
use duet_core::{IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

mod rtc_engine;

pub use rtc_engine::{RtcEngine, RtcEngineFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A local candidate was gathered and should be trickled to the peer.
    LocalCandidate(IceCandidate),
    Connectivity(Connectivity),
    /// Remote media arrived and can be attached to the remote surface.
    RemoteTrack { stream_id: String, track_id: String },
}

/// The peer-to-peer negotiation engine (one peer connection).
///
/// Every call may fail with [`CallError::Negotiation`]; the caller logs it
/// and keeps the session going.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn add_local_media(&self, media: &LocalMedia) -> Result<(), CallError>;
    async fn create_offer(&self) -> Result<SessionDescription, CallError>;
    async fn create_answer(&self) -> Result<SessionDescription, CallError>;
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), CallError>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), CallError>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CallError>;
    async fn close(&self) -> Result<(), CallError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Arc<dyn NegotiationEngine>, CallError>;
}
