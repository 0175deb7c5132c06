use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use dashmap::DashMap;
use duet_core::{ConnectionId, Liveness, RoomId, ServerEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct ConnectionEntry {
    outbound: mpsc::UnboundedSender<Message>,
    room: Option<RoomId>,
    liveness: Liveness,
}

/// Open channels, their outbound queues and the room each one is in.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn: ConnectionId, outbound: mpsc::UnboundedSender<Message>) {
        self.connections.insert(
            conn,
            ConnectionEntry {
                outbound,
                room: None,
                liveness: Liveness::Open,
            },
        );
    }

    /// Unknown connections report `Closed`.
    pub fn liveness(&self, conn: &ConnectionId) -> Liveness {
        self.connections
            .get(conn)
            .map(|entry| entry.liveness)
            .unwrap_or(Liveness::Closed)
    }

    pub fn is_open(&self, conn: &ConnectionId) -> bool {
        self.liveness(conn) == Liveness::Open
    }

    pub fn current_room(&self, conn: &ConnectionId) -> Option<RoomId> {
        self.connections.get(conn).and_then(|entry| entry.room.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub(crate) fn set_room(&self, conn: &ConnectionId, room: Option<RoomId>) {
        if let Some(mut entry) = self.connections.get_mut(conn) {
            entry.room = room;
        }
    }

    /// Records `room` only while the connection is still open.
    pub(crate) fn attach_room(&self, conn: &ConnectionId, room: RoomId) -> bool {
        match self.connections.get_mut(conn) {
            Some(mut entry) if entry.liveness == Liveness::Open => {
                entry.room = Some(room);
                true
            }
            _ => false,
        }
    }

    /// Moves an open connection to `Closing` and hands back its room.
    /// Returns `None` if the connection was already closing or unknown.
    pub(crate) fn begin_close(&self, conn: &ConnectionId) -> Option<Option<RoomId>> {
        let mut entry = self.connections.get_mut(conn)?;
        if entry.liveness != Liveness::Open {
            return None;
        }
        entry.liveness = Liveness::Closing;
        Some(entry.room.take())
    }

    pub(crate) fn unregister(&self, conn: &ConnectionId) {
        self.connections.remove(conn);
    }
}

impl SignalingOutput for ConnectionRegistry {
    fn deliver(&self, conn: &ConnectionId, envelope: &ServerEnvelope) {
        let Some(entry) = self.connections.get(conn) else {
            warn!("Attempted to deliver to disconnected connection {}", conn);
            return;
        };
        if entry.liveness != Liveness::Open {
            debug!("Skipping delivery to closing connection {}", conn);
            return;
        }
        if let Err(e) = entry.outbound.send(Message::Text(envelope.encode().into())) {
            error!("Failed to queue WS message for {}: {:?}", conn, e);
        }
    }
}
