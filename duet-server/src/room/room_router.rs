use crate::error::RouterError;
use crate::room::{Room, RoomCommand};
use crate::signaling::{ConnectionRegistry, SignalingOutput};
use dashmap::DashMap;
use duet_core::{ConnectionId, RoomId, ServerEnvelope};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// What a routed command did, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Joined { notified: usize },
    AlreadyMember,
    Relayed { recipients: usize },
    Left { notified: usize },
    NotMember,
    Disconnected { notified: usize },
}

/// Owns the room table and fans envelopes out to room members.
///
/// Every membership change and the notifications it triggers happen while
/// the room's map entry is locked, so concurrent joins, relays and leaves
/// on one room never see a half-updated member list.
#[derive(Clone)]
pub struct RoomRouter {
    rooms: Arc<DashMap<RoomId, Room>>,
    registry: ConnectionRegistry,
    output: Arc<dyn SignalingOutput>,
}

impl RoomRouter {
    pub fn new(registry: ConnectionRegistry, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            registry,
            output,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn dispatch(&self, cmd: RoomCommand) -> Result<RouteOutcome, RouterError> {
        match cmd {
            RoomCommand::Join { conn, room } => self.join(conn, room),
            RoomCommand::Signal {
                conn,
                room,
                payload,
            } => self.relay(conn, &room, payload),
            RoomCommand::Leave { conn, room } => self.leave(conn, &room),
            RoomCommand::Disconnect { conn } => Ok(self.disconnect(conn)),
        }
    }

    pub fn join(&self, conn: ConnectionId, room_id: RoomId) -> Result<RouteOutcome, RouterError> {
        if !self.registry.is_open(&conn) {
            return Err(RouterError::UnknownConnection(conn));
        }

        if let Some(previous) = self.registry.current_room(&conn) {
            if previous == room_id {
                return Ok(RouteOutcome::AlreadyMember);
            }
            info!("Connection {} moves from '{}' to '{}'", conn, previous, room_id);
            self.remove_member(&conn, &previous);
        }

        // A disconnect that lands after the liveness check above either wins
        // `attach_room` or finds the room recorded and waits on this entry.
        let notified = {
            let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                Room::default()
            });
            if self.registry.attach_room(&conn, room_id.clone()) {
                let existing: Vec<ConnectionId> = room.others(&conn).copied().collect();
                room.insert(conn);
                for member in &existing {
                    self.output.deliver(member, &ServerEnvelope::PeerJoined);
                }
                Some(existing.len())
            } else {
                None
            }
        };

        let Some(notified) = notified else {
            self.rooms.remove_if(&room_id, |_, room| room.is_empty());
            return Err(RouterError::UnknownConnection(conn));
        };

        info!("Connection {} joined room '{}'", conn, room_id);
        Ok(RouteOutcome::Joined { notified })
    }

    pub fn relay(
        &self,
        conn: ConnectionId,
        room_id: &RoomId,
        payload: Value,
    ) -> Result<RouteOutcome, RouterError> {
        if self.registry.current_room(&conn).as_ref() != Some(room_id) {
            return Err(RouterError::NotInRoom {
                conn,
                room: room_id.clone(),
            });
        }

        let Some(room) = self.rooms.get(room_id) else {
            return Ok(RouteOutcome::Relayed { recipients: 0 });
        };

        let envelope = ServerEnvelope::Signal { payload };
        let mut recipients = 0;
        for member in room.others(&conn) {
            self.output.deliver(member, &envelope);
            recipients += 1;
        }

        debug!(
            "Relayed signal from {} in '{}' to {} member(s)",
            conn, room_id, recipients
        );
        Ok(RouteOutcome::Relayed { recipients })
    }

    pub fn leave(&self, conn: ConnectionId, room_id: &RoomId) -> Result<RouteOutcome, RouterError> {
        if !self.registry.is_open(&conn) {
            return Err(RouterError::UnknownConnection(conn));
        }
        if self.registry.current_room(&conn).as_ref() != Some(room_id) {
            debug!("Connection {} is not in '{}', leave ignored", conn, room_id);
            return Ok(RouteOutcome::NotMember);
        }

        self.registry.set_room(&conn, None);
        let notified = self.remove_member(&conn, room_id);
        info!("Connection {} left room '{}'", conn, room_id);
        Ok(RouteOutcome::Left { notified })
    }

    /// Abrupt close. Only the first call for a connection has any effect.
    pub fn disconnect(&self, conn: ConnectionId) -> RouteOutcome {
        let Some(room) = self.registry.begin_close(&conn) else {
            return RouteOutcome::NotMember;
        };

        let notified = match &room {
            Some(room_id) => self.remove_member(&conn, room_id),
            None => 0,
        };
        self.registry.unregister(&conn);

        info!("Connection {} disconnected (room: {:?})", conn, room);
        RouteOutcome::Disconnected { notified }
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_exists(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn current_room(&self, conn: &ConnectionId) -> Option<RoomId> {
        self.registry.current_room(conn)
    }

    /// Removes `conn` from the room and tells the remaining members, in join
    /// order, while the room is locked. Empty rooms are dropped.
    fn remove_member(&self, conn: &ConnectionId, room_id: &RoomId) -> usize {
        let notified = {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                return 0;
            };
            if !room.remove(conn) {
                return 0;
            }
            for member in room.members() {
                self.output.deliver(member, &ServerEnvelope::Leave);
            }
            room.len()
        };

        if self.rooms.remove_if(room_id, |_, room| room.is_empty()).is_some() {
            info!("Room '{}' is empty, removing", room_id);
        }
        notified
    }
}
