use crate::models::types::ClientId;
use crate::net::connection::Connection;
use crate::net::packets::Payload;
use async_trait::async_trait;
use std::sync::Arc;

/// Behaviour of a connection in one phase of its life. A connection holds at most one
/// state; switching runs the old state's `on_exit` before the new state's `on_enter`.
///
/// Handlers take `&self` and may be entered concurrently: once from the connection's
/// own read loop and once from the hub's broadcast fan-out. Mutable state goes behind
/// locks or atomics.
///
/// A handler invoked for a message attributed to another client must not broadcast,
/// the hub is the one delivering it.
#[async_trait]
pub trait ClientState: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_enter(&self, _client: &Arc<dyn Connection>) {}

    async fn handle_message(&self, client: &Arc<dyn Connection>, sender_id: ClientId, payload: Payload);

    fn on_exit(&self, _client: &Arc<dyn Connection>) {}
}
