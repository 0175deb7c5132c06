use crate::room::RoomRouter;
use crate::signaling::{ConnectionRegistry, ws_handler};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;

/// Shared state handed to every WebSocket handler.
#[derive(Clone)]
pub struct SignalingService {
    router: RoomRouter,
}

impl SignalingService {
    pub fn new() -> Self {
        let registry = ConnectionRegistry::new();
        let output = Arc::new(registry.clone());
        Self {
            router: RoomRouter::new(registry, output),
        }
    }

    pub fn router(&self) -> &RoomRouter {
        &self.router
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        self.router.registry()
    }

    /// HTTP app upgrading WebSocket connections at `/`.
    pub fn app(&self) -> Router {
        Router::new()
            .route("/", get(ws_handler))
            .with_state(self.clone())
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}
