use crate::error::RegisterError;
use crate::models::player::Player;
use crate::models::types::ClientId;
use crate::net::connection::Connection;
use crate::net::packets::Payload;
use crate::state::{BrowsingHiscores, ClientState, InGame};
use async_trait::async_trait;
use std::sync::Arc;

/// Same text for unknown users and wrong passwords so the reply does not reveal
/// which usernames exist.
pub const LOGIN_DENIED: &str = "Incorrect username or password";
pub const USER_EXISTS: &str = "User already exists";
pub const REGISTER_FAILED: &str = "Error registering user (internal server error) - please try again later";

/// Initial state of every registered connection: waiting for login or registration.
pub struct Connected;

#[async_trait]
impl ClientState for Connected {
    fn name(&self) -> &'static str {
        "Connected"
    }

    fn on_enter(&self, client: &Arc<dyn Connection>) {
        client.send(Payload::Id { id: client.id() });
    }

    async fn handle_message(&self, client: &Arc<dyn Connection>, sender_id: ClientId, payload: Payload) {
        if sender_id != client.id() {
            tracing::debug!(client_id = client.id(), sender_id, kind = payload.kind(), "ignoring message from another client");
            return;
        }

        match payload {
            Payload::LoginRequest { username, password } => login(client, &username, &password).await,
            Payload::RegisterRequest {
                username,
                password,
                color,
            } => register(client, &username, &password, color).await,
            Payload::HiscoreBoardRequest => client.set_state(Some(Arc::new(BrowsingHiscores))),
            other => {
                tracing::debug!(client_id = client.id(), kind = other.kind(), "ignored before login");
            }
        }
    }
}

async fn login(client: &Arc<dyn Connection>, username: &str, password: &str) {
    match client.hub().accounts.login(username, password).await {
        Ok(record) => {
            tracing::info!(client_id = client.id(), username, "user logged in successfully");
            client.send(Payload::OkResponse);
            client.set_state(Some(Arc::new(InGame::new(Player::from_record(&record)))));
        }
        Err(e) => {
            tracing::warn!(client_id = client.id(), username, error = %e, "login failed");
            client.send(Payload::deny(LOGIN_DENIED));
        }
    }
}

async fn register(client: &Arc<dyn Connection>, username: &str, password: &str, color: i32) {
    let reason = match client.hub().accounts.register(username, password, color).await {
        Ok(_) => {
            tracing::info!(client_id = client.id(), username, "user registered successfully");
            client.send(Payload::OkResponse);
            return;
        }
        Err(RegisterError::InvalidUsername(why)) => format!("Invalid username: {why}"),
        Err(RegisterError::AlreadyExists) => USER_EXISTS.to_string(),
        Err(e @ RegisterError::InternalError(_)) => {
            tracing::error!(client_id = client.id(), username, error = %e, "error registering user");
            REGISTER_FAILED.to_string()
        }
    };

    tracing::info!(client_id = client.id(), username, %reason, "registration denied");
    client.send(Payload::deny(reason));
}
