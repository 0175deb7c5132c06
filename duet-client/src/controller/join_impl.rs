use super::{ActiveCall, CallController, CandidateFeed, ControllerEvent, active_call, forward};
use crate::engine::NegotiationEngine;
use crate::error::CallError;
use crate::media::LocalMedia;
use crate::session::NegotiationSession;
use crate::signaling::SignalingChannel;
use duet_core::{ClientEnvelope, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

impl CallController {
    /// Starts media acquisition and the relay connection side by side. The
    /// engine is built once both are in hand.
    pub(super) fn start_call(&mut self, room: RoomId) {
        if let Some(call) = &self.call {
            warn!(
                "Join '{}' ignored: already in room '{}'",
                room,
                call.session.room()
            );
            return;
        }
        if room.as_str().is_empty() {
            warn!("Join ignored: empty room id");
            return;
        }

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        info!("Joining room '{}' (call {})", room, epoch);
        self.call = Some(ActiveCall::new(NegotiationSession::new(epoch, room)));
        self.set_status("Requesting camera and microphone");

        let media = self.media.clone();
        let constraints = self.config.constraints;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = media.get_user_media(constraints).await;
            let _ = tx.send(ControllerEvent::MediaReady { epoch, result });
        });

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        forward(signal_rx, self.events_tx.clone(), move |event| {
            ControllerEvent::Signaling { epoch, event }
        });
        let connector = self.connector.clone();
        let url = self.config.signaling_url.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = connector.connect(&url, signal_tx).await;
            let _ = tx.send(ControllerEvent::ChannelReady { epoch, result });
        });
    }

    pub(super) fn on_media_ready(&mut self, epoch: u64, result: Result<LocalMedia, CallError>) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            if let Ok(media) = result {
                debug!("Releasing media acquired for abandoned call {}", epoch);
                media.stop();
            }
            return;
        };

        match result {
            Ok(media) => {
                info!("Local media ready ({} tracks)", media.tracks.len());
                call.surfaces.local = Some(media.id.clone());
                call.media = Some(media);
                self.try_build_engine();
            }
            Err(e) => self.fail(e),
        }
    }

    pub(super) fn on_channel_ready(
        &mut self,
        epoch: u64,
        result: Result<Box<dyn SignalingChannel>, CallError>,
    ) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            if let Ok(channel) = result {
                debug!("Closing relay channel opened for abandoned call {}", epoch);
                channel.close();
            }
            return;
        };

        match result {
            Ok(channel) => {
                call.channel = Some(channel);
                self.set_status("Connected to signaling server");
                self.try_build_engine();
            }
            Err(e) => self.fail(e),
        }
    }

    fn try_build_engine(&mut self) {
        let Some(call) = self.call.as_mut() else {
            return;
        };
        let Some(media) = call.media.clone() else {
            return;
        };
        if call.channel.is_none() || !call.session.request_engine() {
            return;
        }

        let epoch = call.session.epoch();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        forward(engine_rx, self.events_tx.clone(), move |event| {
            ControllerEvent::Engine { epoch, event }
        });

        let engines = self.engines.clone();
        let ice_servers = self.config.ice_servers.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match engines.create(&ice_servers, engine_tx).await {
                Ok(engine) => match engine.add_local_media(&media).await {
                    Ok(()) => Ok(engine),
                    Err(e) => {
                        let _ = engine.close().await;
                        Err(e)
                    }
                },
                Err(e) => Err(e),
            };
            let _ = tx.send(ControllerEvent::EngineReady { epoch, result });
        });
    }

    /// Local tracks are attached; announce ourselves to the room.
    pub(super) fn on_engine_ready(
        &mut self,
        epoch: u64,
        result: Result<Arc<dyn NegotiationEngine>, CallError>,
    ) {
        let Some(call) = active_call(&mut self.call, epoch) else {
            if let Ok(engine) = result {
                debug!("Closing engine built for abandoned call {}", epoch);
                tokio::spawn(async move {
                    let _ = engine.close().await;
                });
            }
            return;
        };

        let engine = match result {
            Ok(engine) => engine,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        call.candidates = Some(CandidateFeed::spawn(engine.clone()));
        call.engine = Some(engine);
        call.session.enter_negotiating();
        let join = ClientEnvelope::Join {
            room: call.session.room().clone(),
        };
        let status = format!("Waiting for peer in room '{}'", call.session.room());

        if self.send_envelope(join) {
            self.set_status(status);
        }
    }
}
