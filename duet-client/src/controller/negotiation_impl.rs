use super::{ActiveCall, CallController, CandidateFeed, ControllerEvent, active_call};
use crate::engine::{EngineEvent, NegotiationEngine};
use crate::error::CallError;
use crate::state::{CallState, Connectivity};
use duet_core::{ClientEnvelope, IceCandidate, SessionDescription, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

impl CallController {
    pub(super) fn spawn_offer(&self, epoch: u64, engine: Arc<dyn NegotiationEngine>) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let offer = engine.create_offer().await?;
                engine.set_local_description(offer.clone()).await?;
                Ok::<_, CallError>(offer)
            }
            .await;
            let _ = tx.send(ControllerEvent::OfferReady { epoch, result });
        });
    }

    fn spawn_answer(&self, epoch: u64, engine: Arc<dyn NegotiationEngine>) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let answer = engine.create_answer().await?;
                engine.set_local_description(answer.clone()).await?;
                Ok::<_, CallError>(answer)
            }
            .await;
            let _ = tx.send(ControllerEvent::AnswerReady { epoch, result });
        });
    }

    pub(super) fn spawn_set_remote(
        &self,
        epoch: u64,
        engine: Arc<dyn NegotiationEngine>,
        desc: SessionDescription,
    ) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = engine
                .set_remote_description(desc.clone())
                .await
                .map(|()| desc);
            let _ = tx.send(ControllerEvent::RemoteApplied { epoch, result });
        });
    }

    fn send_signal(&mut self, payload: SignalPayload) -> bool {
        let Some(call) = &self.call else {
            return false;
        };
        let envelope = ClientEnvelope::Signal {
            room: call.session.room().clone(),
            payload: payload.to_value(),
        };
        self.send_envelope(envelope)
    }

    pub(super) fn on_offer_ready(
        &mut self,
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    ) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            return;
        };
        match result {
            Ok(offer) => {
                call.session.offer_created(offer.clone());
                if self.send_signal(SignalPayload::Offer(offer)) {
                    self.set_status("Calling peer");
                }
            }
            Err(e) => {
                warn!("Could not create offer: {}", e);
                call.session.offer_failed();
            }
        }
    }

    pub(super) fn on_answer_ready(
        &mut self,
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    ) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            return;
        };
        match result {
            Ok(answer) => {
                call.session.answer_created(answer.clone());
                if self.send_signal(SignalPayload::Answer(answer)) {
                    self.set_status("Answering call");
                }
            }
            Err(e) => {
                warn!("Could not create answer: {}", e);
                call.session.answer_failed();
            }
        }
    }

    /// Flushes candidates that arrived early, then answers if the applied
    /// description was an offer.
    pub(super) fn on_remote_applied(
        &mut self,
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    ) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            return;
        };
        let Some(engine) = call.engine.clone() else {
            return;
        };

        match result {
            Ok(desc) => {
                let early = call.session.remote_applied(desc);
                if !early.is_empty() {
                    debug!("Applying {} buffered candidates", early.len());
                }
                let answer = call.session.begin_answer_creation();
                call.feed_candidates(early);
                if answer {
                    self.spawn_answer(epoch, engine);
                }
            }
            Err(e) => {
                warn!("Remote description rejected: {}", e);
                call.session.remote_rejected();
            }
        }
    }

    pub(super) fn on_engine_event(&mut self, epoch: u64, event: EngineEvent) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            debug!("Dropping engine event for call {}: {:?}", epoch, event);
            return;
        };

        match event {
            EngineEvent::LocalCandidate(candidate) => {
                self.send_signal(SignalPayload::Candidate(candidate));
            }
            EngineEvent::RemoteTrack { stream_id, .. } => {
                info!("Remote stream {} attached", stream_id);
                call.surfaces.remote = Some(stream_id);
            }
            EngineEvent::Connectivity(state) => {
                let was_connected = call.session.state() == CallState::Connected;
                match state {
                    Connectivity::Connected | Connectivity::Completed => {
                        if call.session.mark_connected() {
                            info!("Peer connection established");
                        }
                        self.set_status(format!("Connection: {}", state));
                    }
                    Connectivity::Failed => {
                        self.fail(CallError::Transport("connectivity checks failed".to_owned()));
                    }
                    Connectivity::Closed if was_connected => {
                        self.teardown(CallState::Closed, "Connection closed");
                    }
                    _ => self.set_status(format!("Connection: {}", state)),
                }
            }
        }
    }
}

impl CandidateFeed {
    /// A rejected candidate is logged and skipped.
    pub(super) fn spawn(engine: Arc<dyn NegotiationEngine>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<IceCandidate>();
        let task = tokio::spawn(async move {
            while let Some(candidate) = rx.recv().await {
                if let Err(e) = engine.add_ice_candidate(candidate).await {
                    warn!("Skipping remote candidate: {}", e);
                }
            }
        });
        Self { tx, task }
    }
}

impl ActiveCall {
    pub(super) fn feed_candidates(&self, candidates: Vec<IceCandidate>) {
        let Some(feed) = &self.candidates else {
            return;
        };
        for candidate in candidates {
            if feed.tx.send(candidate).is_err() {
                warn!("Candidate feed stopped, dropping remote candidate");
                return;
            }
        }
    }
}
