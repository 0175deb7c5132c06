use crate::media::MediaConstraints;
use duet_core::IceServerConfig;
use duet_core::utils::{DEFAULT_SIGNALING_URL, DEFAULT_STUN_ADDR};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay.
    pub signaling_url: String,
    /// Connectivity-assist (STUN/TURN) servers handed to the engine.
    pub ice_servers: Vec<IceServerConfig>,
    pub constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_owned(),
            ice_servers: vec![IceServerConfig::new(DEFAULT_STUN_ADDR)],
            constraints: MediaConstraints::default(),
        }
    }
}
