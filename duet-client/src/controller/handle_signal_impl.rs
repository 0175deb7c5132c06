use super::{CallController, active_call};
use crate::error::CallError;
use crate::signaling::SignalingEvent;
use crate::state::CallState;
use duet_core::{SdpType, ServerEnvelope, SignalPayload};
use serde_json::Value;
use tracing::{debug, info, warn};

impl CallController {
    pub(super) fn on_signaling_event(&mut self, epoch: u64, event: SignalingEvent) {
        if active_call(&mut self.call, epoch).is_none() {
            debug!("Dropping relay event for call {}: {:?}", epoch, event);
            return;
        }

        match event {
            SignalingEvent::Closed => {
                self.fail(CallError::Transport("relay connection closed".to_owned()));
            }
            SignalingEvent::Envelope(ServerEnvelope::Leave) => {
                info!("Peer left the room");
                self.teardown(CallState::Idle, "User left the room");
            }
            SignalingEvent::Envelope(ServerEnvelope::PeerJoined) => self.on_peer_joined(),
            SignalingEvent::Envelope(ServerEnvelope::Signal { payload }) => {
                self.on_signal(payload)
            }
        }
    }

    /// We were in the room first, so we make the offer.
    fn on_peer_joined(&mut self) {
        let Some(call) = self.call.as_mut() else {
            return;
        };
        let Some(engine) = call.engine.clone() else {
            return;
        };
        if !call.session.begin_offer() {
            debug!("Peer joined, negotiation already under way");
            return;
        }
        let epoch = call.session.epoch();
        info!("Peer joined, creating offer");
        self.spawn_offer(epoch, engine);
    }

    fn on_signal(&mut self, payload: Value) {
        let Some(call) = self.call.as_mut() else {
            return;
        };
        let Some(engine) = call.engine.clone() else {
            debug!("Signal before the engine is ready, ignoring");
            return;
        };
        let payload = match SignalPayload::from_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Ignoring unreadable signal payload: {}", e);
                return;
            }
        };
        let epoch = call.session.epoch();

        match payload {
            SignalPayload::Offer(desc) if desc.kind == SdpType::Offer => {
                if !call.session.begin_answer() {
                    warn!("Ignoring offer in role {:?}", call.session.role());
                    return;
                }
                info!("Received offer, answering");
                self.spawn_set_remote(epoch, engine, desc);
            }
            SignalPayload::Answer(desc) if desc.kind == SdpType::Answer => {
                if !call.session.begin_accept_answer() {
                    warn!("Ignoring answer in role {:?}", call.session.role());
                    return;
                }
                info!("Received answer");
                self.spawn_set_remote(epoch, engine, desc);
            }
            SignalPayload::Offer(desc) | SignalPayload::Answer(desc) => {
                warn!("Ignoring description with mismatched type {:?}", desc.kind);
            }
            SignalPayload::Candidate(candidate) => match call.session.accept_candidate(candidate) {
                Some(candidate) => call.feed_candidates(vec![candidate]),
                None => debug!(
                    "Buffered candidate until remote description ({} pending)",
                    call.session.pending_candidates().len()
                ),
            },
        }
    }
}
