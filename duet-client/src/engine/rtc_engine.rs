use super::{EngineEvent, EngineFactory, NegotiationEngine};
use crate::error::CallError;
use crate::media::{LocalMedia, TrackKind};
use crate::state::Connectivity;
use anyhow::{Context, Result};
use async_trait::async_trait;
use duet_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`RtcEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcEngineFactory;

#[async_trait]
impl EngineFactory for RtcEngineFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Arc<dyn NegotiationEngine>, CallError> {
        let engine = RtcEngine::new(ice_servers, events)
            .await
            .map_err(rejected)?;
        Ok(Arc::new(engine))
    }
}

/// A webrtc-rs peer connection driven by the call controller.
pub struct RtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcEngine {
    /// Creates the peer connection and wires its callbacks into `events`.
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    credential: server.credential.clone().unwrap_or_default(),
                    username: server.username.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                // `None` marks the end of gathering.
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(EngineEvent::LocalCandidate(from_init(init)));
            })
        }));

        let state_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("ICE connection state changed: {}", s);
                    let _ = tx.send(EngineEvent::Connectivity(connectivity(s)));
                })
            },
        ));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let stream_id = track.stream_id();
                    let track_id = track.id();
                    debug!("Remote track {} on stream {}", track_id, stream_id);
                    let _ = tx.send(EngineEvent::RemoteTrack {
                        stream_id,
                        track_id,
                    });
                })
            },
        ));

        Ok(Self { peer_connection })
    }

    async fn attach(&self, media: &LocalMedia) -> Result<()> {
        for track in &media.tracks {
            let mime_type = match track.kind {
                TrackKind::Audio => MIME_TYPE_OPUS,
                TrackKind::Video => MIME_TYPE_VP8,
            };
            let local = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: mime_type.to_owned(),
                    ..Default::default()
                },
                track.id.clone(),
                media.id.clone(),
            ));
            let sender = self
                .peer_connection
                .add_track(local as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("Failed to attach {:?} track", track.kind))?;

            // RTCP has to be drained for the interceptors to run.
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while let Ok((_, _)) = sender.read(&mut rtcp_buf).await {}
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NegotiationEngine for RtcEngine {
    async fn add_local_media(&self, media: &LocalMedia) -> Result<(), CallError> {
        self.attach(media).await.map_err(rejected)
    }

    async fn create_offer(&self) -> Result<SessionDescription, CallError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(rejected)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, CallError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(rejected)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), CallError> {
        let desc = to_rtc(desc).map_err(rejected)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(rejected)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), CallError> {
        let desc = to_rtc(desc).map_err(rejected)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(rejected)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CallError> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                username_fragment: candidate.username_fragment,
            })
            .await
            .map_err(rejected)
    }

    async fn close(&self) -> Result<(), CallError> {
        self.peer_connection.close().await.map_err(rejected)
    }
}

fn rejected(e: impl std::fmt::Display) -> CallError {
    CallError::Negotiation(e.to_string())
}

fn to_rtc(desc: SessionDescription) -> webrtc::error::Result<RTCSessionDescription> {
    match desc.kind {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
    }
}

fn from_init(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn connectivity(state: RTCIceConnectionState) -> Connectivity {
    match state {
        RTCIceConnectionState::Checking => Connectivity::Checking,
        RTCIceConnectionState::Connected => Connectivity::Connected,
        RTCIceConnectionState::Completed => Connectivity::Completed,
        RTCIceConnectionState::Disconnected => Connectivity::Disconnected,
        RTCIceConnectionState::Failed => Connectivity::Failed,
        RTCIceConnectionState::Closed => Connectivity::Closed,
        _ => Connectivity::New,
    }
}
