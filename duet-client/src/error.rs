use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// Camera/microphone denied or unavailable. Ends the session.
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),

    /// A description or candidate the engine refused. The session carries on.
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    /// The relay channel could not be opened or dropped. Ends the session.
    #[error("relay transport failed: {0}")]
    Transport(String),

    #[error("signaling channel is not open")]
    ChannelNotOpen,
}
