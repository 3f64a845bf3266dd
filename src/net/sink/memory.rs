//! In-process transport: a pair of channels standing in for a socket. Used by bots
//! and by the test suite to drive a full connection without a network.

use crate::net::sink::{ClientSink, ClientSource};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

pub struct MemorySource {
    rx: mpsc::Receiver<anyhow::Result<Bytes>>,
}

pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

/// The remote end. Dropping `inbound` looks like a clean close to the server;
/// dropping `outbound` makes the next server write fail.
pub struct MemoryPeer {
    pub inbound: mpsc::Sender<anyhow::Result<Bytes>>,
    pub outbound: mpsc::UnboundedReceiver<String>,
}

pub fn memory_transport() -> (MemorySource, MemorySink, MemoryPeer) {
    let (in_tx, in_rx) = mpsc::channel(64);
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    (
        MemorySource { rx: in_rx },
        MemorySink { tx: Some(out_tx) },
        MemoryPeer {
            inbound: in_tx,
            outbound: out_rx,
        },
    )
}

#[async_trait]
impl ClientSource for MemorySource {
    async fn next_frame(&mut self) -> Option<anyhow::Result<Bytes>> {
        self.rx.recv().await
    }
}

#[async_trait]
impl ClientSink for MemorySink {
    async fn send_frame(&mut self, frame: String) -> anyhow::Result<()> {
        let Some(tx) = &self.tx else {
            anyhow::bail!("memory transport already closed");
        };
        tx.send(frame)
            .map_err(|_| anyhow::Error::msg("memory peer went away"))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.tx = None;
        Ok(())
    }
}
