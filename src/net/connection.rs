use crate::hub::Hub;
use crate::models::types::ClientId;
use crate::net::packets::{self, Envelope, Payload};
use crate::net::sink::{ClientSink, ClientSource};
use crate::state::{ClientState, Connected};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// Outbound messages queued per connection before new ones are dropped.
pub const SEND_QUEUE_CAPACITY: usize = 256;

/// A client as seen by the hub and by client states.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Zero until the hub has registered the connection
    fn id(&self) -> ClientId;

    fn hub(&self) -> &Arc<Hub>;

    /// Called by the hub once an id has been assigned. Enters the `Connected` state.
    fn initialize(&self, id: ClientId);

    /// Exits the current state (if any) and enters `state` (if any).
    fn set_state(&self, state: Option<Arc<dyn ClientState>>);

    /// Hands a message to the current state. Ignored when there is none.
    async fn process_message(&self, sender_id: ClientId, payload: Payload);

    /// Queues a message to this client's transport, attributed to itself.
    fn send(&self, payload: Payload) {
        self.send_as(payload, self.id());
    }

    /// Queues a message to this client's transport. Never blocks: when the queue is
    /// full the message is dropped.
    fn send_as(&self, payload: Payload, sender_id: ClientId);

    /// Delivers a message from this client straight to the peer's state handler.
    async fn pass_to_peer(&self, payload: Payload, peer_id: ClientId) {
        match self.hub().clients.get(peer_id) {
            Some(peer) => peer.process_message(self.id(), payload).await,
            None => tracing::debug!(client_id = self.id(), peer_id, "peer is gone"),
        }
    }

    /// Sends a message to every other connected client through the hub.
    async fn broadcast(&self, payload: Payload) {
        self.hub().broadcast(Envelope::new(self.id(), payload)).await;
    }

    /// Tears the connection down. Only the first call has any effect.
    async fn close(&self, reason: &str);
}

/// A connection driven by a transport.
pub struct Client {
    id: AtomicU64,
    this: Weak<Client>,
    hub: Arc<Hub>,
    state: RwLock<Option<Arc<dyn ClientState>>>,
    outbound: Mutex<Option<mpsc::Sender<Envelope>>>,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

impl Client {
    /// The receiver is the outbound queue, to be drained by [`Client::write_loop`].
    pub fn new(hub: Arc<Hub>) -> (Arc<Self>, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let client = Arc::new_cyclic(|this| Self {
            id: AtomicU64::new(0),
            this: this.clone(),
            hub,
            state: RwLock::new(None),
            outbound: Mutex::new(Some(tx)),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        });

        (client, rx)
    }

    pub fn state_name(&self) -> Option<&'static str> {
        self.state.read().as_ref().map(|s| s.name())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn handle(&self) -> Option<Arc<dyn Connection>> {
        self.this.upgrade().map(|c| c as Arc<dyn Connection>)
    }

    /// Exits the current state and enters `next`. The caller holds the state lock.
    fn switch_state(
        &self,
        state: &mut Option<Arc<dyn ClientState>>,
        next: Option<Arc<dyn ClientState>>,
        me: &Arc<dyn Connection>,
    ) {
        tracing::info!(
            client_id = self.id(),
            from = state.as_ref().map_or("none", |s| s.name()),
            to = next.as_ref().map_or("none", |s| s.name()),
            "switching state"
        );

        if let Some(prev) = state.take() {
            prev.on_exit(me);
        }
        *state = next;
        if let Some(current) = state.as_ref() {
            current.on_enter(me);
        }
    }

    /// Decodes inbound frames and feeds them to the current state until the peer goes
    /// away or the connection is closed.
    pub async fn read_loop<S: ClientSource>(self: Arc<Self>, mut source: S) {
        loop {
            let frame = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                frame = source.next_frame() => frame,
            };

            let data = match frame {
                Some(Ok(data)) => data,
                Some(Err(e)) => {
                    tracing::warn!(client_id = self.id(), error = %e, "read failed");
                    break;
                }
                None => {
                    tracing::debug!(client_id = self.id(), "peer closed the connection");
                    break;
                }
            };

            let env = match packets::decode(&data) {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(client_id = self.id(), error = %e, "dropping undecodable frame");
                    continue;
                }
            };

            let id = self.id();
            if env.sender_id != 0 && env.sender_id != id {
                tracing::warn!(client_id = id, claimed = env.sender_id, "client claimed a foreign sender id");
            }
            self.process_message(id, env.payload).await;
        }

        self.close("read loop ended").await;
    }

    /// Encodes queued messages onto the transport. Ends once the queue is closed and
    /// drained, or the transport fails.
    pub async fn write_loop<K: ClientSink>(self: Arc<Self>, mut queue: mpsc::Receiver<Envelope>, mut sink: K) {
        while let Some(env) = queue.recv().await {
            let frame = match packets::encode(&env) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(client_id = self.id(), kind = env.payload.kind(), error = %e, "error encoding message");
                    continue;
                }
            };

            if let Err(e) = sink.send_frame(frame).await {
                tracing::warn!(client_id = self.id(), error = %e, "write failed");
                break;
            }
        }

        if let Err(e) = sink.close().await {
            tracing::debug!(client_id = self.id(), error = %e, "error closing transport");
        }
        self.close("write loop ended").await;
    }
}

#[async_trait]
impl Connection for Client {
    fn id(&self) -> ClientId {
        self.id.load(Ordering::Acquire)
    }

    fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    fn initialize(&self, id: ClientId) {
        self.id.store(id, Ordering::Release);
        self.set_state(Some(Arc::new(Connected)));
    }

    fn set_state(&self, next: Option<Arc<dyn ClientState>>) {
        let Some(me) = self.handle() else {
            return;
        };

        // Held across exit and enter so a concurrent switch cannot interleave
        let mut state = self.state.write();
        if next.is_some() && self.is_closed() {
            // A slow handler finishing after close must not bring the connection back to life
            tracing::debug!(
                client_id = self.id(),
                to = next.as_ref().map_or("none", |s| s.name()),
                "connection closed, state not entered"
            );
            return;
        }

        self.switch_state(&mut state, next, &me);
    }

    async fn process_message(&self, sender_id: ClientId, payload: Payload) {
        let current = self.state.read().clone();
        let (Some(current), Some(me)) = (current, self.handle()) else {
            return;
        };

        current.handle_message(&me, sender_id, payload).await;
    }

    fn send_as(&self, payload: Payload, sender_id: ClientId) {
        let outbound = self.outbound.lock();
        let Some(tx) = outbound.as_ref() else {
            tracing::trace!(client_id = self.id(), kind = payload.kind(), "connection closed, dropping message");
            return;
        };

        match tx.try_send(Envelope::new(sender_id, payload)) {
            Ok(()) => {}
            Err(TrySendError::Full(env)) => {
                tracing::warn!(client_id = self.id(), kind = env.payload.kind(), "send queue full, dropping message");
            }
            Err(TrySendError::Closed(env)) => {
                tracing::debug!(client_id = self.id(), kind = env.payload.kind(), "writer gone, dropping message");
            }
        }
    }

    async fn close(&self, reason: &str) {
        {
            // Latching `closed` under the state lock orders it against any in-flight switch
            let mut state = self.state.write();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }

            tracing::info!(client_id = self.id(), reason, "closing client connection");
            match self.handle() {
                Some(me) => self.switch_state(&mut state, None, &me),
                None => drop(state.take()),
            }
        }

        self.hub.unregister(self.id()).await;
        self.shutdown.cancel();
        // Dropping the sender lets the write loop drain what is queued and close the transport
        self.outbound.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::services::account::tests::service;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ClientState for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_enter(&self, _client: &Arc<dyn Connection>) {
            self.log.lock().push(format!("enter {}", self.name));
        }

        async fn handle_message(&self, _client: &Arc<dyn Connection>, sender_id: ClientId, payload: Payload) {
            self.log.lock().push(format!("{} got {} from {}", self.name, payload.kind(), sender_id));
        }

        fn on_exit(&self, _client: &Arc<dyn Connection>) {
            self.log.lock().push(format!("exit {}", self.name));
        }
    }

    fn client() -> (Arc<Client>, mpsc::Receiver<Envelope>) {
        let (hub, _hub_loop) = Hub::new(Arc::new(service()), WorldConfig::default());
        Client::new(hub)
    }

    #[tokio::test]
    async fn full_queue_drops_newest() {
        let (client, mut rx) = client();

        for i in 0..300 {
            client.send_as(Payload::Chat { msg: i.to_string() }, 7);
        }

        let mut received = Vec::new();
        while let Ok(env) = rx.try_recv() {
            received.push(env);
        }

        assert_eq!(received.len(), SEND_QUEUE_CAPACITY);
        assert_eq!(received[0], Envelope::new(7, Payload::Chat { msg: "0".into() }));
        assert_eq!(received[255].payload, Payload::Chat { msg: "255".into() });
    }

    #[tokio::test]
    async fn state_switch_exits_before_entering() {
        let (client, _rx) = client();
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = |name| -> Option<Arc<dyn ClientState>> { Some(Arc::new(Recording { name, log: log.clone() })) };

        client.set_state(state("A"));
        client.process_message(4, Payload::OkResponse).await;
        client.set_state(state("B"));
        assert_eq!(client.state_name(), Some("B"));
        client.set_state(None);
        client.process_message(4, Payload::OkResponse).await;

        assert_eq!(
            *log.lock(),
            vec!["enter A", "A got ok_response from 4", "exit A", "enter B", "exit B"]
        );
        assert_eq!(client.state_name(), None);
    }

    #[tokio::test]
    async fn no_state_is_entered_after_close() {
        let (client, _rx) = client();
        let log = Arc::new(Mutex::new(Vec::new()));
        client.set_state(Some(Arc::new(Recording { name: "A", log: log.clone() })));

        client.close("transport failed").await;
        client.set_state(Some(Arc::new(Recording { name: "B", log: log.clone() })));

        assert_eq!(*log.lock(), vec!["enter A", "exit A"]);
        assert_eq!(client.state_name(), None);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_stops_sends() {
        let (client, mut rx) = client();
        let log = Arc::new(Mutex::new(Vec::new()));
        client.set_state(Some(Arc::new(Recording { name: "A", log: log.clone() })));

        client.close("test").await;
        client.close("again").await;
        client.send(Payload::OkResponse);

        assert!(client.is_closed());
        assert_eq!(*log.lock(), vec!["enter A", "exit A"]);
        assert!(rx.recv().await.is_none());
    }
}
