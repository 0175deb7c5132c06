use duet_core::RoomId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AwaitingLocalMedia,
    Negotiating,
    Connected,
    Closed,
    Failed,
}

impl CallState {
    /// States from which a new join is accepted.
    pub fn is_resting(&self) -> bool {
        matches!(self, Self::Idle | Self::Closed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unset,
    Offerer,
    Answerer,
}

/// Connectivity-check state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Completed => "completed",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Ids of the streams currently attached to the two video surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSurfaces {
    pub local: Option<String>,
    pub remote: Option<String>,
}

/// What the UI shows: one state, one status line, two surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSnapshot {
    pub state: CallState,
    pub role: Role,
    pub room: Option<RoomId>,
    pub status: String,
    pub surfaces: MediaSurfaces,
}

impl Default for CallSnapshot {
    fn default() -> Self {
        Self {
            state: CallState::Idle,
            role: Role::Unset,
            room: None,
            status: "Disconnected".to_owned(),
            surfaces: MediaSurfaces::default(),
        }
    }
}
