//! The coordinator. Owns the client registry and the shared world, assigns ids to
//! new connections and fans broadcasts out to everyone but the sender.

use crate::config::WorldConfig;
use crate::models::player::Player;
use crate::models::spore::Spore;
use crate::models::types::ClientId;
use crate::net::connection::{Client, Connection};
use crate::net::packets::Envelope;
use crate::net::sink::{ClientSink, ClientSource};
use crate::services::AccountService;
use crate::state::registry::Registry;
use crate::world;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

const BROADCAST_CAPACITY: usize = 256;
const REGISTRATION_CAPACITY: usize = 64;

/// Everything in the world that players can see.
#[derive(Default)]
pub struct SharedGameObjects {
    /// Keyed by the owning connection's id
    pub players: Registry<Arc<RwLock<Player>>>,
    pub spores: Registry<Spore>,
}

struct Registration {
    client: Arc<dyn Connection>,
    ack: oneshot::Sender<ClientId>,
}

pub struct Hub {
    pub clients: Registry<Arc<dyn Connection>>,
    pub objects: Arc<SharedGameObjects>,
    pub accounts: Arc<AccountService>,
    pub world: WorldConfig,
    broadcast_tx: mpsc::Sender<Envelope>,
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<ClientId>,
}

/// The hub's event loop. Created together with the [`Hub`] and driven by [`HubLoop::run`].
pub struct HubLoop {
    hub: Arc<Hub>,
    pub(crate) broadcast_rx: mpsc::Receiver<Envelope>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::Receiver<ClientId>,
}

impl Hub {
    pub fn new(accounts: Arc<AccountService>, world: WorldConfig) -> (Arc<Hub>, HubLoop) {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_CAPACITY);
        let (register_tx, register_rx) = mpsc::channel(REGISTRATION_CAPACITY);
        let (unregister_tx, unregister_rx) = mpsc::channel(REGISTRATION_CAPACITY);

        let hub = Arc::new(Hub {
            clients: Registry::new(),
            objects: Arc::new(SharedGameObjects::default()),
            accounts,
            world,
            broadcast_tx,
            register_tx,
            unregister_tx,
        });

        let hub_loop = HubLoop {
            hub: hub.clone(),
            broadcast_rx,
            register_rx,
            unregister_rx,
        };

        (hub, hub_loop)
    }

    /// Hands the connection to the hub and waits for its id. `None` when the hub
    /// loop is not running.
    pub async fn register(&self, client: Arc<dyn Connection>) -> Option<ClientId> {
        let (ack, assigned) = oneshot::channel();
        self.register_tx.send(Registration { client, ack }).await.ok()?;
        assigned.await.ok()
    }

    pub async fn unregister(&self, id: ClientId) {
        if self.unregister_tx.send(id).await.is_err() {
            tracing::debug!(client_id = id, "hub loop gone, unregister skipped");
        }
    }

    /// Queues `env` for delivery to every client except `env.sender_id`.
    pub async fn broadcast(&self, env: Envelope) {
        if self.broadcast_tx.send(env).await.is_err() {
            tracing::debug!("hub loop gone, broadcast dropped");
        }
    }

    /// Runs one connection over the given transport until it ends: registers it, starts
    /// the writer and drives the reader on the current task.
    pub async fn serve<S, K>(self: &Arc<Self>, source: S, sink: K)
    where
        S: ClientSource + 'static,
        K: ClientSink + 'static,
    {
        let (client, queue) = Client::new(self.clone());
        let Some(id) = self.register(client.clone()).await else {
            tracing::warn!("hub is not accepting connections");
            return;
        };

        tracing::debug!(client_id = id, "starting client loops");
        tokio::spawn(client.clone().write_loop(queue, sink));
        client.read_loop(source).await;
    }
}

impl HubLoop {
    /// Seeds the world, starts replenishment and processes registrations, removals and
    /// broadcasts until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let HubLoop {
            hub,
            mut broadcast_rx,
            mut register_rx,
            mut unregister_rx,
        } = self;

        tracing::info!(count = hub.world.max_spores, "placing spores");
        world::seed_spores(&hub.objects, hub.world.max_spores);

        tokio::spawn(world::replenish_spores_loop(hub.clone(), shutdown.child_token()));

        tracing::info!("awaiting client registrations");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(reg) = register_rx.recv() => hub.on_register(reg),
                Some(id) = unregister_rx.recv() => hub.on_unregister(id),
                Some(env) = broadcast_rx.recv() => hub.on_broadcast(env).await,
                else => break,
            }
        }

        tracing::info!("hub loop stopped");
    }
}

impl Hub {
    fn on_register(&self, reg: Registration) {
        let id = self.clients.add(reg.client.clone());
        tracing::info!(client_id = id, "client registered");
        reg.client.initialize(id);
        if reg.ack.send(id).is_err() {
            tracing::debug!(client_id = id, "registration ack not awaited");
        }
    }

    fn on_unregister(&self, id: ClientId) {
        if self.clients.remove(id).is_some() {
            tracing::info!(client_id = id, "client unregistered");
        }
    }

    /// Delivers to every client but the sender, one after another.
    async fn on_broadcast(&self, env: Envelope) {
        for (id, client) in self.clients.snapshot() {
            if id != env.sender_id {
                client.process_message(env.sender_id, env.payload.clone()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::packets::Payload;
    use crate::services::account::tests::service;
    use crate::state::ClientState;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// Records what the hub delivers instead of running a state machine.
    struct RecordingConnection {
        id: AtomicU64,
        hub: Arc<Hub>,
        seen: Mutex<Vec<(ClientId, Payload)>>,
    }

    impl RecordingConnection {
        fn new(hub: &Arc<Hub>) -> Arc<Self> {
            Arc::new(Self {
                id: AtomicU64::new(0),
                hub: hub.clone(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Connection for RecordingConnection {
        fn id(&self) -> ClientId {
            self.id.load(Ordering::Acquire)
        }

        fn hub(&self) -> &Arc<Hub> {
            &self.hub
        }

        fn initialize(&self, id: ClientId) {
            self.id.store(id, Ordering::Release);
        }

        fn set_state(&self, _state: Option<Arc<dyn ClientState>>) {}

        async fn process_message(&self, sender_id: ClientId, payload: Payload) {
            self.seen.lock().push((sender_id, payload));
        }

        fn send_as(&self, _payload: Payload, _sender_id: ClientId) {}

        async fn close(&self, _reason: &str) {
            self.hub.unregister(self.id()).await;
        }
    }

    fn quiet_world() -> WorldConfig {
        WorldConfig {
            max_spores: 0,
            ..WorldConfig::default()
        }
    }

    async fn eventually(cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn broadcast_skips_the_sender() {
        let (hub, hub_loop) = Hub::new(Arc::new(service()), quiet_world());
        let shutdown = CancellationToken::new();
        let running = tokio::spawn(hub_loop.run(shutdown.clone()));

        let a = RecordingConnection::new(&hub);
        let b = RecordingConnection::new(&hub);
        let c = RecordingConnection::new(&hub);
        let a_id = hub.register(a.clone()).await.unwrap();
        let b_id = hub.register(b.clone()).await.unwrap();
        let c_id = hub.register(c.clone()).await.unwrap();
        assert_eq!((a_id, b_id, c_id), (1, 2, 3));

        a.broadcast(Payload::Chat { msg: "hi".into() }).await;
        eventually(|| b.seen.lock().len() == 1 && c.seen.lock().len() == 1).await;

        let chat = (a_id, Payload::Chat { msg: "hi".into() });
        assert!(a.seen.lock().is_empty());
        assert_eq!(*b.seen.lock(), vec![chat.clone()]);
        assert_eq!(*c.seen.lock(), vec![chat]);

        c.close("done").await;
        eventually(|| !hub.clients.contains(c_id)).await;
        assert_eq!(hub.clients.len(), 2);

        shutdown.cancel();
        running.await.unwrap();
    }

    #[tokio::test]
    async fn pass_to_peer_runs_peer_handler_directly() {
        let (hub, _hub_loop) = Hub::new(Arc::new(service()), quiet_world());
        let a = RecordingConnection::new(&hub);
        let b = RecordingConnection::new(&hub);
        a.initialize(hub.clients.add(a.clone()));
        b.initialize(hub.clients.add(b.clone()));

        a.pass_to_peer(Payload::Chat { msg: "psst".into() }, b.id()).await;
        a.pass_to_peer(Payload::OkResponse, 99).await;

        assert_eq!(*b.seen.lock(), vec![(a.id(), Payload::Chat { msg: "psst".into() })]);
        assert!(a.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn register_fails_without_a_loop() {
        let (hub, hub_loop) = Hub::new(Arc::new(service()), quiet_world());
        drop(hub_loop);
        assert_eq!(hub.register(RecordingConnection::new(&hub)).await, None);
    }
}
