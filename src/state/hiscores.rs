use crate::models::types::ClientId;
use crate::net::connection::Connection;
use crate::net::packets::Payload;
use crate::state::ClientState;
use async_trait::async_trait;
use std::sync::Arc;

/// Entered from `Connected` on a hiscore board request. Nothing is served yet, every
/// message is ignored.
pub struct BrowsingHiscores;

#[async_trait]
impl ClientState for BrowsingHiscores {
    fn name(&self) -> &'static str {
        "BrowsingHiscores"
    }

    async fn handle_message(&self, client: &Arc<dyn Connection>, sender_id: ClientId, payload: Payload) {
        tracing::trace!(client_id = client.id(), sender_id, kind = payload.kind(), "ignored while browsing hiscores");
    }
}
