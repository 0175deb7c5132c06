use anyhow::{Context, Result};
use duet_core::{ClientEnvelope, RoomId, ServerEnvelope};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A raw WebSocket peer speaking the envelope protocol.
pub struct TestClient {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let url = format!("ws://{}/", addr);
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .context("Failed to connect to relay")?;
        let (sink, stream) = ws.split();
        Ok(Self { sink, stream })
    }

    pub async fn send(&mut self, envelope: &ClientEnvelope) -> Result<()> {
        self.send_raw(&envelope.encode()).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.sink
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn send_binary(&mut self, data: &[u8]) -> Result<()> {
        self.sink
            .send(Message::Binary(data.to_vec().into()))
            .await
            .context("Failed to send binary frame")
    }

    pub async fn join(&mut self, room: &str) -> Result<()> {
        self.send(&ClientEnvelope::Join {
            room: RoomId::from(room),
        })
        .await
    }

    pub async fn signal(&mut self, room: &str, payload: Value) -> Result<()> {
        self.send(&ClientEnvelope::Signal {
            room: RoomId::from(room),
            payload,
        })
        .await
    }

    pub async fn leave(&mut self, room: &str) -> Result<()> {
        self.send(&ClientEnvelope::Leave {
            room: RoomId::from(room),
        })
        .await
    }

    /// Next envelope from the relay, skipping control frames.
    pub async fn recv(&mut self, timeout_ms: u64) -> Result<ServerEnvelope> {
        let next = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return ServerEnvelope::decode(text.as_str())
                            .context("Relay sent a malformed envelope");
                    }
                    Some(Ok(Message::Close(_))) | None => anyhow::bail!("Relay closed"),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e).context("WebSocket error"),
                }
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), next)
            .await
            .context("Timeout waiting for envelope")?
    }

    /// Fails if any envelope arrives within `ms`.
    pub async fn expect_silence(&mut self, ms: u64) -> Result<()> {
        match self.recv(ms).await {
            Ok(envelope) => anyhow::bail!("Unexpected envelope: {:?}", envelope),
            Err(_) => Ok(()),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.sink
            .send(Message::Close(None))
            .await
            .context("Failed to send close frame")
    }

    /// Drops the TCP stream without a close handshake.
    pub fn drop_abruptly(self) {
        drop(self.sink);
        drop(self.stream);
    }
}
