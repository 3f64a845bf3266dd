pub mod memory;
pub mod websocket;

use async_trait::async_trait;
use bytes::Bytes;

/// Write half of a transport: one encoded envelope per frame.
#[async_trait]
pub trait ClientSink: Send {
    async fn send_frame(&mut self, frame: String) -> anyhow::Result<()>;

    /// Closes the underlying transport. Called once, after the last frame.
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Read half of a transport.
#[async_trait]
pub trait ClientSource: Send {
    /// Next data frame. `None` once the peer has closed the connection; an error for
    /// anything that ends the connection abnormally.
    async fn next_frame(&mut self) -> Option<anyhow::Result<Bytes>>;
}
