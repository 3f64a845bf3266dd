use crate::models::player::{PLAYER_RADIUS, PLAYER_SPAWN_EXTENT, PLAYER_SPEED, Player};
use crate::models::types::ClientId;
use crate::net::connection::Connection;
use crate::net::packets::{Payload, PlayerSnapshot};
use crate::state::ClientState;
use crate::world;
use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// A logged-in player in the world. Owns the background tasks started on its behalf
/// (spore streaming and movement); all of them stop when the state is exited.
pub struct InGame {
    player: Arc<RwLock<Player>>,
    tasks: CancellationToken,
    moving: AtomicBool,
}

impl InGame {
    pub fn new(player: Player) -> Self {
        Self {
            player: Arc::new(RwLock::new(player)),
            tasks: CancellationToken::new(),
            moving: AtomicBool::new(false),
        }
    }

    fn start_moving(&self, client: &Arc<dyn Connection>) {
        if self.moving.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::debug!(client_id = client.id(), "starting movement loop");
        tokio::spawn(world::movement_loop(
            client.clone(),
            self.player.clone(),
            self.tasks.child_token(),
        ));
    }
}

#[async_trait]
impl ClientState for InGame {
    fn name(&self) -> &'static str {
        "InGame"
    }

    fn on_enter(&self, client: &Arc<dyn Connection>) {
        let id = client.id();
        let snapshot = {
            let mut player = self.player.write();
            let mut rng = rand::rng();
            player.x = rng.random::<f64>() * PLAYER_SPAWN_EXTENT;
            player.y = rng.random::<f64>() * PLAYER_SPAWN_EXTENT;
            player.speed = PLAYER_SPEED;
            player.radius = PLAYER_RADIUS;
            PlayerSnapshot::new(id, &player)
        };

        tracing::info!(client_id = id, name = %snapshot.name, "adding player to the world");
        let hub = client.hub();
        hub.objects.players.insert(id, self.player.clone());
        client.send(Payload::Player(snapshot));

        tokio::spawn(world::stream_spores(
            client.clone(),
            hub.world.spore_batch_size,
            hub.world.spore_batch_delay(),
            self.tasks.child_token(),
        ));
    }

    async fn handle_message(&self, client: &Arc<dyn Connection>, sender_id: ClientId, payload: Payload) {
        let own = sender_id == client.id();

        match payload {
            Payload::Player(_) if own => {
                // Our position is authoritative on the server, echoes are noise
            }
            Payload::PlayerDirection { direction } if own => {
                self.player.write().direction = direction;
                self.start_moving(client);
            }
            Payload::Chat { .. } if own => client.broadcast(payload).await,
            Payload::SporeConsumed { spore_id } => {
                tracing::info!(client_id = client.id(), sender_id, spore_id, "spore consumed");
            }
            payload @ (Payload::Player(_) | Payload::Chat { .. } | Payload::Spore(_)) if !own => {
                client.send_as(payload, sender_id);
            }
            other => {
                tracing::debug!(client_id = client.id(), sender_id, kind = other.kind(), "ignored in game");
            }
        }
    }

    fn on_exit(&self, client: &Arc<dyn Connection>) {
        self.tasks.cancel();
        if client.hub().objects.players.remove(client.id()).is_some() {
            tracing::info!(client_id = client.id(), "removed player from the world");
        }
    }
}
