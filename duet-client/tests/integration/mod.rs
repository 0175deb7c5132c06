//! Integration tests for duet-client.
//!
//! Tests are organized by functionality:
//! - `lifecycle_tests` - join, leave, failures and late completions
//! - `negotiation_tests` - offer/answer and candidate handling
//! - `relay_tests` - two controllers talking through a real relay


use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use duet_client::{CallController, CallHandle, CallSnapshot, CallState, ClientConfig};

use crate::utils::{
    FakeEngineFactory, FakeMediaDevices, FakeRelay, MediaBehavior, STATE_TIMEOUT_MS,
};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A controller wired to fakes, plus the fakes for inspection.
pub struct Harness {
    pub handle: CallHandle,
    pub relay: FakeRelay,
    pub engines: FakeEngineFactory,
    pub media: FakeMediaDevices,
}

pub fn start_controller(behavior: MediaBehavior) -> Harness {
    let relay = FakeRelay::new();
    let engines = FakeEngineFactory::new();
    let media = FakeMediaDevices::new(behavior);

    let (handle, _task) = CallController::spawn(
        ClientConfig::default(),
        Arc::new(media.clone()),
        Arc::new(engines.clone()),
        Arc::new(relay.clone()),
    );

    Harness {
        handle,
        relay,
        engines,
        media,
    }
}

/// Start a controller and join `room`, returning once the join went out.
pub async fn joined(room: &str) -> Harness {
    let harness = start_controller(MediaBehavior::Grant);
    harness.handle.join(room).expect("controller running");
    wait_for_state(&harness.handle, CallState::Negotiating).await;
    harness
}

pub async fn wait_for_state(handle: &CallHandle, state: CallState) -> CallSnapshot {
    tokio::time::timeout(
        Duration::from_millis(STATE_TIMEOUT_MS),
        handle.wait_for(|s| s.state == state),
    )
    .await
    .unwrap_or_else(|_| panic!("Timed out waiting for {:?}, at {:?}", state, handle.snapshot()))
    .expect("controller running")
}
