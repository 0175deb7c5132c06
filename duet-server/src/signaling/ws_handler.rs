use crate::SignalingService;
use crate::room::RoomCommand;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use duet_core::{ClientEnvelope, ConnectionId, ProtocolError};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let conn = ConnectionId::new();
    info!("New WebSocket connection: {}", conn);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.registry().register(conn, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let envelope = match msg {
                    Message::Text(text) => ClientEnvelope::decode(text.as_str()),
                    Message::Binary(_) => Err(ProtocolError::UnsupportedFrame("binary")),
                    Message::Close(_) => break,
                    _ => continue,
                };

                let envelope = match envelope {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Dropping envelope from {}: {}", conn, e);
                        continue;
                    }
                };

                let cmd = RoomCommand::from_envelope(conn, envelope);
                if let Err(e) = service.router().dispatch(cmd) {
                    warn!("Dropping envelope from {}: {}", conn, e);
                }
            }
        }
    });

    let send_finished = tokio::select! {
        _ = (&mut send_task) => true,
        _ = (&mut recv_task) => false,
    };
    let survivor = if send_finished { recv_task } else { send_task };
    // Awaited so no dispatch from it can run after the disconnect.
    survivor.abort();
    let _ = survivor.await;

    service.router().dispatch(RoomCommand::Disconnect { conn }).ok();
    info!("WebSocket disconnected: {}", conn);
}
