use crate::db::error::DbError;
use crate::db::repo::{PlayerRepo, UserRepo};
use crate::db::DbResult;
use crate::models::account::User;
use crate::models::player::PlayerRecord;
use crate::models::types::{PlayerId, UserId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Ephemeral user/player store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemTables>,
}

#[derive(Default)]
struct MemTables {
    users: HashMap<String, User>,
    players: HashMap<UserId, PlayerRecord>,
    next_user_id: i64,
    next_player_id: i64,
}

impl MemTables {
    fn insert_user(&mut self, username: &str, password_hash: &str) -> DbResult<User> {
        if self.users.contains_key(username) {
            return Err(DbError::UniqueViolation);
        }
        self.next_user_id += 1;
        let user = User {
            id: UserId(self.next_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    fn insert_player(&mut self, user_id: UserId, name: &str, color: i32) -> DbResult<PlayerRecord> {
        if self.players.contains_key(&user_id) {
            return Err(DbError::UniqueViolation);
        }
        self.next_player_id += 1;
        let player = PlayerRecord {
            id: PlayerId(self.next_player_id),
            user_id,
            name: name.to_string(),
            best_score: 0,
            color,
        };
        self.players.insert(user_id, player.clone());
        Ok(player)
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryRepository {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.inner.lock().users.get(username).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<User> {
        self.inner.lock().insert_user(username, password_hash)
    }

    async fn create_user_with_player(
        &self,
        username: &str,
        password_hash: &str,
        player_name: &str,
        color: i32,
    ) -> DbResult<(User, PlayerRecord)> {
        // One lock for both inserts; a fresh user id can never already own a player
        let mut tables = self.inner.lock();
        let user = tables.insert_user(username, password_hash)?;
        let player = tables.insert_player(user.id, player_name, color)?;
        Ok((user, player))
    }
}

#[async_trait]
impl PlayerRepo for MemoryRepository {
    async fn get_by_user_id(&self, user_id: UserId) -> DbResult<Option<PlayerRecord>> {
        Ok(self.inner.lock().players.get(&user_id).cloned())
    }

    async fn create_player(&self, user_id: UserId, name: &str, color: i32) -> DbResult<PlayerRecord> {
        self.inner.lock().insert_player(user_id, name, color)
    }
}
