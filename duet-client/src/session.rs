use crate::state::{CallState, Role};
use duet_core::{IceCandidate, RoomId, SessionDescription};
use std::mem;

/// Negotiation bookkeeping for one call attempt.
///
/// The session only decides; the controller performs the engine calls it
/// asks for and reports back. `epoch` identifies the attempt so that late
/// completions from a previous one can be recognized and dropped.
#[derive(Debug)]
pub struct NegotiationSession {
    epoch: u64,
    room: RoomId,
    state: CallState,
    role: Role,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    pending_candidates: Vec<IceCandidate>,
    engine_requested: bool,
    offer_in_flight: bool,
    answer_in_flight: bool,
    remote_in_flight: bool,
}

impl NegotiationSession {
    pub fn new(epoch: u64, room: RoomId) -> Self {
        Self {
            epoch,
            room,
            state: CallState::AwaitingLocalMedia,
            role: Role::Unset,
            local_description: None,
            remote_description: None,
            pending_candidates: Vec::new(),
            engine_requested: false,
            offer_in_flight: false,
            answer_in_flight: false,
            remote_in_flight: false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn pending_candidates(&self) -> &[IceCandidate] {
        &self.pending_candidates
    }

    /// Claims engine construction. True at most once, and only before the
    /// session starts negotiating.
    pub fn request_engine(&mut self) -> bool {
        if self.state != CallState::AwaitingLocalMedia || self.engine_requested {
            return false;
        }
        self.engine_requested = true;
        true
    }

    pub fn enter_negotiating(&mut self) {
        if self.state == CallState::AwaitingLocalMedia {
            self.state = CallState::Negotiating;
        }
    }

    pub fn mark_connected(&mut self) -> bool {
        if self.state != CallState::Negotiating {
            return false;
        }
        self.state = CallState::Connected;
        true
    }

    fn is_negotiating(&self) -> bool {
        matches!(self.state, CallState::Negotiating | CallState::Connected)
    }

    fn untouched(&self) -> bool {
        self.local_description.is_none()
            && self.remote_description.is_none()
            && !self.offer_in_flight
            && !self.remote_in_flight
    }

    /// A peer joined after us: we offer, unless negotiation already started.
    pub fn begin_offer(&mut self) -> bool {
        if !self.is_negotiating() || self.role != Role::Unset || !self.untouched() {
            return false;
        }
        self.role = Role::Offerer;
        self.offer_in_flight = true;
        true
    }

    pub fn offer_created(&mut self, offer: SessionDescription) {
        self.offer_in_flight = false;
        self.local_description = Some(offer);
    }

    pub fn offer_failed(&mut self) {
        self.offer_in_flight = false;
        if self.local_description.is_none() {
            self.role = Role::Unset;
        }
    }

    /// An offer arrived: we answer it if we have not offered ourselves.
    pub fn begin_answer(&mut self) -> bool {
        if !self.is_negotiating() || self.role == Role::Offerer || !self.untouched() {
            return false;
        }
        self.role = Role::Answerer;
        self.remote_in_flight = true;
        true
    }

    /// An answer arrived: accepted only in reply to our own offer.
    pub fn begin_accept_answer(&mut self) -> bool {
        if self.role != Role::Offerer
            || self.local_description.is_none()
            || self.remote_description.is_some()
            || self.remote_in_flight
        {
            return false;
        }
        self.remote_in_flight = true;
        true
    }

    /// Records the applied remote description and hands back every candidate
    /// that arrived before it, in arrival order. The buffer is left empty.
    pub fn remote_applied(&mut self, desc: SessionDescription) -> Vec<IceCandidate> {
        self.remote_in_flight = false;
        self.remote_description = Some(desc);
        mem::take(&mut self.pending_candidates)
    }

    pub fn remote_rejected(&mut self) {
        self.remote_in_flight = false;
        if self.role == Role::Answerer && self.local_description.is_none() {
            self.role = Role::Unset;
        }
    }

    /// True once an applied offer still needs our answer.
    pub fn begin_answer_creation(&mut self) -> bool {
        if self.role != Role::Answerer
            || self.remote_description.is_none()
            || self.local_description.is_some()
            || self.answer_in_flight
        {
            return false;
        }
        self.answer_in_flight = true;
        true
    }

    pub fn answer_created(&mut self, answer: SessionDescription) {
        self.answer_in_flight = false;
        self.local_description = Some(answer);
    }

    pub fn answer_failed(&mut self) {
        self.answer_in_flight = false;
    }

    /// Returns the candidate if it can be applied now, or buffers it until
    /// the remote description is set.
    pub fn accept_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_description.is_some() {
            return Some(candidate);
        }
        self.pending_candidates.push(candidate);
        None
    }
}
