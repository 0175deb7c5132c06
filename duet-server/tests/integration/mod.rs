//! Integration tests for duet-server.
//!
//! Tests are organized by functionality:
//! - `connection_tests` - accept, abrupt close, malformed frames
//! - `messaging_tests` - signal fanout between room members
//! - `multi_peer_tests` - membership changes with several peers


use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use duet_core::ConnectionId;
use duet_server::{ConnectionRegistry, RoomRouter};

use crate::utils::{Delivered, MockSignalingOutput};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Create a router whose output is captured instead of written to sockets.
///
/// Returns (router, captured output, delivery receiver) for test control.
pub fn create_test_router() -> (
    RoomRouter,
    MockSignalingOutput,
    mpsc::UnboundedReceiver<Delivered>,
) {
    let (signaling, rx) = MockSignalingOutput::new();
    let router = RoomRouter::new(ConnectionRegistry::new(), Arc::new(signaling.clone()));
    (router, signaling, rx)
}

/// Register a connection with the router's registry, as the WebSocket handler does on accept.
pub fn register_connection(router: &RoomRouter) -> ConnectionId {
    let conn = ConnectionId::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    router.registry().register(conn, tx);
    conn
}
