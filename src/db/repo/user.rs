use crate::db::DbResult;
use crate::models::account::User;
use crate::models::player::PlayerRecord;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Looks up a user by (already case-folded) username
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// Inserts a new user. Fails with `UniqueViolation` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<User>;

    /// Inserts a user and its player row as one unit: either both exist afterwards or neither does.
    async fn create_user_with_player(
        &self,
        username: &str,
        password_hash: &str,
        player_name: &str,
        color: i32,
    ) -> DbResult<(User, PlayerRecord)>;
}
