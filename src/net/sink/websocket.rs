use crate::net::sink::{ClientSink, ClientSource};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

pub struct WebSocketSink {
    ws: SplitSink<WebSocket, Message>,
}

impl WebSocketSink {
    pub fn new(ws: SplitSink<WebSocket, Message>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl ClientSink for WebSocketSink {
    async fn send_frame(&mut self, frame: String) -> anyhow::Result<()> {
        self.ws
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| anyhow::Error::msg(format!("websocket send failed: {e}")))?;

        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.ws
            .close()
            .await
            .map_err(|e| anyhow::Error::msg(format!("websocket close failed: {e}")))?;

        Ok(())
    }
}

pub struct WebSocketSource {
    ws: SplitStream<WebSocket>,
}

impl WebSocketSource {
    pub fn new(ws: SplitStream<WebSocket>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl ClientSource for WebSocketSource {
    async fn next_frame(&mut self) -> Option<anyhow::Result<Bytes>> {
        loop {
            let msg = match self.ws.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(anyhow::Error::msg(format!("websocket read failed: {e}")))),
            };

            return match msg {
                Message::Text(t) => Some(Ok(Bytes::copy_from_slice(t.as_str().as_bytes()))),
                Message::Binary(b) => Some(Ok(b)),
                // Axum already handles Pong responses automatically
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => None,
            };
        }
    }
}
