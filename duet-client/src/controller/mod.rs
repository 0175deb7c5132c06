use crate::config::ClientConfig;
use crate::engine::{EngineEvent, EngineFactory, NegotiationEngine};
use crate::error::CallError;
use crate::media::{LocalMedia, MediaDevices};
use crate::session::NegotiationSession;
use crate::signaling::{SignalingChannel, SignalingConnector, SignalingEvent};
use crate::state::{CallSnapshot, CallState, MediaSurfaces, Role};
use duet_core::{IceCandidate, RoomId, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

mod handle_signal_impl;
mod join_impl;
mod negotiation_impl;
mod teardown_impl;

/// User intents accepted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join(RoomId),
    Leave,
    /// Leaves any active call and stops the controller.
    Shutdown,
}

/// Everything the controller loop reacts to. Completions of asynchronous
/// work carry the epoch of the call that started them.
pub(crate) enum ControllerEvent {
    Command(Command),
    MediaReady {
        epoch: u64,
        result: Result<LocalMedia, CallError>,
    },
    ChannelReady {
        epoch: u64,
        result: Result<Box<dyn SignalingChannel>, CallError>,
    },
    EngineReady {
        epoch: u64,
        result: Result<Arc<dyn NegotiationEngine>, CallError>,
    },
    Signaling {
        epoch: u64,
        event: SignalingEvent,
    },
    Engine {
        epoch: u64,
        event: EngineEvent,
    },
    OfferReady {
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    },
    AnswerReady {
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    },
    RemoteApplied {
        epoch: u64,
        result: Result<SessionDescription, CallError>,
    },
}

/// Resources owned by the call in progress. Dropped together on teardown.
struct ActiveCall {
    session: NegotiationSession,
    media: Option<LocalMedia>,
    channel: Option<Box<dyn SignalingChannel>>,
    engine: Option<Arc<dyn NegotiationEngine>>,
    candidates: Option<CandidateFeed>,
    surfaces: MediaSurfaces,
}

/// Remote candidates queued for the engine, applied in the order they were
/// pushed by a task of their own.
struct CandidateFeed {
    tx: mpsc::UnboundedSender<IceCandidate>,
    task: JoinHandle<()>,
}

impl ActiveCall {
    fn new(session: NegotiationSession) -> Self {
        Self {
            session,
            media: None,
            channel: None,
            engine: None,
            candidates: None,
            surfaces: MediaSurfaces::default(),
        }
    }
}

/// Client-side call state machine.
///
/// All state lives in the loop task; adapters and spawned work talk to it
/// only through [`ControllerEvent`]s, so handlers never race each other.
pub struct CallController {
    config: ClientConfig,
    media: Arc<dyn MediaDevices>,
    engines: Arc<dyn EngineFactory>,
    connector: Arc<dyn SignalingConnector>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    snapshot_tx: watch::Sender<CallSnapshot>,
    next_epoch: u64,
    call: Option<ActiveCall>,
    /// State reported while no call is active.
    resting: CallState,
    status: String,
}

impl CallController {
    pub fn new(
        config: ClientConfig,
        media: Arc<dyn MediaDevices>,
        engines: Arc<dyn EngineFactory>,
        connector: Arc<dyn SignalingConnector>,
    ) -> (Self, CallHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(CallSnapshot::default());

        let handle = CallHandle {
            commands: events_tx.clone(),
            snapshot: snapshot_rx,
        };
        let controller = Self {
            config,
            media,
            engines,
            connector,
            events_tx,
            events_rx,
            snapshot_tx,
            next_epoch: 0,
            call: None,
            resting: CallState::Idle,
            status: CallSnapshot::default().status,
        };
        (controller, handle)
    }

    /// Starts the loop on the current runtime.
    pub fn spawn(
        config: ClientConfig,
        media: Arc<dyn MediaDevices>,
        engines: Arc<dyn EngineFactory>,
        connector: Arc<dyn SignalingConnector>,
    ) -> (CallHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, media, engines, connector);
        (handle, tokio::spawn(controller.run()))
    }

    pub async fn run(mut self) {
        info!("Call controller started");
        while let Some(event) = self.events_rx.recv().await {
            let keep_running = self.handle_event(event);
            self.publish();
            if !keep_running {
                break;
            }
        }
        info!("Call controller stopped");
    }

    fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::Command(Command::Join(room)) => self.start_call(room),
            ControllerEvent::Command(Command::Leave) => self.leave_locally(),
            ControllerEvent::Command(Command::Shutdown) => {
                self.leave_locally();
                return false;
            }
            ControllerEvent::MediaReady { epoch, result } => self.on_media_ready(epoch, result),
            ControllerEvent::ChannelReady { epoch, result } => {
                self.on_channel_ready(epoch, result)
            }
            ControllerEvent::EngineReady { epoch, result } => self.on_engine_ready(epoch, result),
            ControllerEvent::Signaling { epoch, event } => self.on_signaling_event(epoch, event),
            ControllerEvent::Engine { epoch, event } => self.on_engine_event(epoch, event),
            ControllerEvent::OfferReady { epoch, result } => self.on_offer_ready(epoch, result),
            ControllerEvent::AnswerReady { epoch, result } => self.on_answer_ready(epoch, result),
            ControllerEvent::RemoteApplied { epoch, result } => {
                self.on_remote_applied(epoch, result)
            }
        }
        true
    }

    fn snapshot(&self) -> CallSnapshot {
        match &self.call {
            Some(call) => CallSnapshot {
                state: call.session.state(),
                role: call.session.role(),
                room: Some(call.session.room().clone()),
                status: self.status.clone(),
                surfaces: call.surfaces.clone(),
            },
            None => CallSnapshot {
                state: self.resting,
                role: Role::Unset,
                room: None,
                status: self.status.clone(),
                surfaces: MediaSurfaces::default(),
            },
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            debug!("Call state: {:?} ({})", snapshot.state, snapshot.status);
            *current = snapshot;
            true
        });
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// The call in progress, if `epoch` still names it.
fn active_call(call: &mut Option<ActiveCall>, epoch: u64) -> Option<&mut ActiveCall> {
    call.as_mut().filter(|c| c.session.epoch() == epoch)
}

/// Re-tags adapter events with the epoch of the call that owns the adapter.
fn forward<T: Send + 'static>(
    mut rx: mpsc::UnboundedReceiver<T>,
    tx: mpsc::UnboundedSender<ControllerEvent>,
    wrap: impl Fn(T) -> ControllerEvent + Send + 'static,
) {
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            if tx.send(wrap(item)).is_err() {
                break;
            }
        }
    });
}

/// Cloneable front end to a running [`CallController`].
#[derive(Clone)]
pub struct CallHandle {
    commands: mpsc::UnboundedSender<ControllerEvent>,
    snapshot: watch::Receiver<CallSnapshot>,
}

impl CallHandle {
    pub fn join(&self, room: impl Into<RoomId>) -> Result<(), CallError> {
        self.send(Command::Join(room.into()))
    }

    pub fn leave(&self) -> Result<(), CallError> {
        self.send(Command::Leave)
    }

    pub fn shutdown(&self) -> Result<(), CallError> {
        self.send(Command::Shutdown)
    }

    pub fn send(&self, command: Command) -> Result<(), CallError> {
        self.commands
            .send(ControllerEvent::Command(command))
            .map_err(|_| CallError::Transport("call controller stopped".to_owned()))
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshot.clone()
    }

    /// Resolves with the first snapshot, current one included, that matches.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&CallSnapshot) -> bool,
    ) -> Result<CallSnapshot, CallError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| CallError::Transport("call controller stopped".to_owned()))?;
        Ok(snapshot.clone())
    }
}
