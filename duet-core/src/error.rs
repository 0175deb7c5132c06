use thiserror::Error;

/// A frame that does not match the envelope protocol. Dropped by whoever receives it.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported frame: {0}")]
    UnsupportedFrame(&'static str),
}
