//! World maintenance: spore placement and replenishment, avatar movement, and the
//! initial spore stream a player gets on joining.

use crate::hub::{Hub, SharedGameObjects};
use crate::models::player::Player;
use crate::models::spore::Spore;
use crate::net::connection::Connection;
use crate::net::packets::{Envelope, Payload, PlayerSnapshot, SporeSnapshot};
use parking_lot::RwLock;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, interval_at, sleep};
use tokio_util::sync::CancellationToken;

/// Seconds of movement applied per tick.
pub const MOVEMENT_DELTA: f64 = 0.05;
/// Side of the square spores are placed in.
pub const SPAWN_AREA: f64 = 3000.0;
const SPAWN_ATTEMPTS: usize = 25;

const SPORE_RADIUS_MEAN: f64 = 10.0;
const SPORE_RADIUS_STD_DEV: f64 = 3.0;
const SPORE_RADIUS_MIN: f64 = 5.0;

/// A spore with a random size at a spot that, if possible, touches nothing else.
pub fn new_spore(objects: &SharedGameObjects) -> Spore {
    let mut rng = rand::rng();
    let radius = Normal::new(SPORE_RADIUS_MEAN, SPORE_RADIUS_STD_DEV)
        .map(|n| n.sample(&mut rng))
        .unwrap_or(SPORE_RADIUS_MEAN)
        .max(SPORE_RADIUS_MIN);
    let (x, y) = spawn_coords(&mut rng, radius, objects);

    Spore { x, y, radius }
}

/// Picks a position for a circle of `radius`. Gives up after a few tries and returns
/// the last candidate, overlapping or not.
pub fn spawn_coords<R: Rng>(rng: &mut R, radius: f64, objects: &SharedGameObjects) -> (f64, f64) {
    let upper = (SPAWN_AREA - radius).max(radius + 1.0);
    let mut candidate = (radius, radius);

    for _ in 0..SPAWN_ATTEMPTS {
        candidate = (rng.random_range(radius..upper), rng.random_range(radius..upper));
        if !occupied(objects, candidate.0, candidate.1, radius) {
            break;
        }
    }

    candidate
}

fn occupied(objects: &SharedGameObjects, x: f64, y: f64, radius: f64) -> bool {
    let mut hit = false;
    objects.players.for_each(|_, p| hit = hit || p.read().overlaps(x, y, radius));
    if hit {
        return true;
    }

    objects.spores.for_each(|_, s| hit = hit || s.overlaps(x, y, radius));
    hit
}

/// Fills the world up to `target` spores without announcing them. Used before any
/// client can connect.
pub fn seed_spores(objects: &SharedGameObjects, target: usize) {
    for _ in objects.spores.len()..target {
        objects.spores.add(new_spore(objects));
    }
}

/// One replenishment tick: tops the world up towards the configured spore count,
/// creating at most one batch, and broadcasts each new spore. Returns how many were made.
pub async fn replenish_spores(hub: &Hub) -> usize {
    let remaining = hub.objects.spores.len();
    let missing = hub.world.max_spores.saturating_sub(remaining);
    if missing == 0 {
        return 0;
    }

    let count = missing.min(hub.world.replenish_batch);
    tracing::info!(remaining, count, "replenishing spores");

    for i in 0..count {
        if i > 0 {
            sleep(hub.world.replenish_pause()).await;
        }

        let spore = new_spore(&hub.objects);
        let id = hub.objects.spores.add(spore);
        hub.broadcast(Envelope::new(0, Payload::Spore(SporeSnapshot::new(id, &spore))))
            .await;
    }

    count
}

pub async fn replenish_spores_loop(hub: Arc<Hub>, cancel: CancellationToken) {
    let period = hub.world.replenish_interval();
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                replenish_spores(&hub).await;
            }
        }
    }

    tracing::debug!("spore replenishment stopped");
}

/// Moves the avatar every tick, tells everyone else where it is, then tells the owner.
pub async fn movement_loop(client: Arc<dyn Connection>, player: Arc<RwLock<Player>>, cancel: CancellationToken) {
    let period = Duration::from_secs_f64(MOVEMENT_DELTA);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let snapshot = {
            let mut p = player.write();
            p.advance(MOVEMENT_DELTA);
            PlayerSnapshot::new(client.id(), &p)
        };

        client.broadcast(Payload::Player(snapshot.clone())).await;
        client.send(Payload::Player(snapshot));
    }

    tracing::debug!(client_id = client.id(), "movement loop stopped");
}

/// Sends the current spores to a player that just joined, in batches so a large world
/// does not arrive as one burst.
pub async fn stream_spores(client: Arc<dyn Connection>, batch_size: usize, delay: Duration, cancel: CancellationToken) {
    let spores: Vec<SporeSnapshot> = client
        .hub()
        .objects
        .spores
        .snapshot()
        .iter()
        .map(|(id, spore)| SporeSnapshot::new(*id, spore))
        .collect();

    tracing::debug!(client_id = client.id(), count = spores.len(), "sending spores");
    for (i, batch) in spores.chunks(batch_size.max(1)).enumerate() {
        if i > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return;
        }

        client.send(Payload::SporesBatch { spores: batch.to_vec() });
    }
}
