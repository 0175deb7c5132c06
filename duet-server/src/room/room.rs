use duet_core::ConnectionId;

/// Ordered membership of one room. Insertion order is join order.
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<ConnectionId>,
}

impl Room {
    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn contains(&self, conn: &ConnectionId) -> bool {
        self.members.contains(conn)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns false if the connection was already a member.
    pub(crate) fn insert(&mut self, conn: ConnectionId) -> bool {
        if self.contains(&conn) {
            return false;
        }
        self.members.push(conn);
        true
    }

    /// Returns false if the connection was not a member.
    pub(crate) fn remove(&mut self, conn: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != conn);
        self.members.len() != before
    }

    /// Every member except `conn`, in join order.
    pub fn others<'a>(&'a self, conn: &'a ConnectionId) -> impl Iterator<Item = &'a ConnectionId> {
        self.members.iter().filter(move |m| *m != conn)
    }
}
