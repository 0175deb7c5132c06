pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod media;
pub mod session;
pub mod signaling;
pub mod state;

pub use config::ClientConfig;
pub use controller::{CallController, CallHandle, Command};
pub use engine::{EngineEvent, EngineFactory, NegotiationEngine, RtcEngine, RtcEngineFactory};
pub use error::CallError;
pub use media::{LocalMedia, MediaConstraints, MediaDevices, MediaTrack, SyntheticDevices, TrackKind};
pub use session::NegotiationSession;
pub use signaling::{SignalingChannel, SignalingConnector, SignalingEvent, WsConnector};
pub use state::{CallSnapshot, CallState, Connectivity, MediaSurfaces, Role};

use std::sync::Arc;

/// Controller wired to the WebSocket relay channel and a webrtc-rs engine.
pub fn spawn_call(
    config: ClientConfig,
    media: Arc<dyn MediaDevices>,
) -> (CallHandle, tokio::task::JoinHandle<()>) {
    CallController::spawn(
        config,
        media,
        Arc::new(RtcEngineFactory),
        Arc::new(WsConnector),
    )
}
