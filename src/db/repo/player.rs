use crate::db::DbResult;
use crate::models::player::PlayerRecord;
use crate::models::types::UserId;

#[async_trait::async_trait]
pub trait PlayerRepo: Send + Sync {
    /// Gets the player row owned by a user
    async fn get_by_user_id(&self, user_id: UserId) -> DbResult<Option<PlayerRecord>>;

    /// Creates the player row for a user
    async fn create_player(&self, user_id: UserId, name: &str, color: i32) -> DbResult<PlayerRecord>;
}
