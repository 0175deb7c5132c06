use super::{SignalingChannel, SignalingConnector, SignalingEvent};
use crate::error::CallError;
use async_trait::async_trait;
use duet_core::{ClientEnvelope, ServerEnvelope};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Relay channel over a WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<SignalingEvent>,
    ) -> Result<Box<dyn SignalingChannel>, CallError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| CallError::Transport(format!("cannot reach {}: {}", url, e)))?;
        info!("WS open: {}", url);

        let (mut write, mut read) = ws.split();
        let (outbound, mut rx) = mpsc::unbounded_channel::<Message>();
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if write.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let reader_open = open.clone();
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        debug!("WS IN: {}", text.as_str());
                        match ServerEnvelope::decode(text.as_str()) {
                            Ok(envelope) => {
                                if events.send(SignalingEvent::Envelope(envelope)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping undecodable relay frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("WS read error: {}", e);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
            info!("WS closed");
            let _ = events.send(SignalingEvent::Closed);
        });

        Ok(Box::new(WsChannel { outbound, open }))
    }
}

struct WsChannel {
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl SignalingChannel for WsChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, envelope: &ClientEnvelope) -> Result<(), CallError> {
        if !self.is_open() {
            return Err(CallError::ChannelNotOpen);
        }
        let text = envelope.encode();
        debug!("WS OUT: {}", text);
        self.outbound.send(Message::Text(text.into())).map_err(|_| {
            self.open.store(false, Ordering::SeqCst);
            CallError::ChannelNotOpen
        })
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.outbound.send(Message::Close(None));
        }
    }
}
