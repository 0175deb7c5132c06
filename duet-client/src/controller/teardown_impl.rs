use super::{ActiveCall, CallController};
use crate::error::CallError;
use crate::state::CallState;
use duet_core::ClientEnvelope;
use tracing::{error, info, warn};

impl CallController {
    /// Sends on the active call's relay channel. A channel that cannot take
    /// the envelope fails the call.
    pub(super) fn send_envelope(&mut self, envelope: ClientEnvelope) -> bool {
        let result = match self.call.as_ref().and_then(|c| c.channel.as_ref()) {
            Some(channel) => channel.send(&envelope),
            None => Err(CallError::ChannelNotOpen),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.fail(CallError::Transport(e.to_string()));
                false
            }
        }
    }

    /// Tells the room we are going, then releases everything.
    pub(super) fn leave_locally(&mut self) {
        let Some(call) = &self.call else {
            if self.resting != CallState::Idle {
                self.resting = CallState::Idle;
                self.set_status("Disconnected");
            }
            return;
        };

        if let Some(channel) = call.channel.as_ref().filter(|c| c.is_open()) {
            let leave = ClientEnvelope::Leave {
                room: call.session.room().clone(),
            };
            if let Err(e) = channel.send(&leave) {
                warn!("Could not announce leave: {}", e);
            }
        }
        info!("Left room '{}'", call.session.room());
        self.teardown(CallState::Idle, "Disconnected");
    }

    pub(super) fn fail(&mut self, error: CallError) {
        error!("Call failed: {}", error);
        self.teardown(CallState::Failed, error.to_string());
    }

    /// Drops the active call, if any, and settles in `resting`.
    pub(super) fn teardown(&mut self, resting: CallState, status: impl Into<String>) {
        if let Some(call) = self.call.take() {
            release(call);
        }
        self.resting = resting;
        self.set_status(status);
    }
}

fn release(call: ActiveCall) {
    if let Some(media) = &call.media {
        media.stop();
    }
    if let Some(channel) = &call.channel {
        channel.close();
    }
    if let Some(feed) = call.candidates {
        feed.task.abort();
    }
    if let Some(engine) = call.engine {
        tokio::spawn(async move {
            if let Err(e) = engine.close().await {
                warn!("Engine close failed: {}", e);
            }
        });
    }
}
