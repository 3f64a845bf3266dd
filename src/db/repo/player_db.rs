use crate::db::repo::PlayerRepo;
use crate::db::{Db, DbResult, map_row, map_row_opt};
use crate::models::player::PlayerRecord;
use crate::models::types::UserId;
use std::sync::Arc;

pub struct PlayerRepository {
    db: Arc<Db>,
}

impl PlayerRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl PlayerRepo for PlayerRepository {
    async fn get_by_user_id(&self, user_id: UserId) -> DbResult<Option<PlayerRecord>> {
        let row_opt = sqlx::query("SELECT * FROM players WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?;

        map_row_opt(
            row_opt,
            PlayerRecord::try_from_row,
            &format!("PlayerRepo::get_by_user_id user_id={}", user_id),
        )
    }

    async fn create_player(&self, user_id: UserId, name: &str, color: i32) -> DbResult<PlayerRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO players (user_id, name, color)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, name, best_score, color
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_one(&self.db.pool)
        .await?;

        map_row(&row, PlayerRecord::try_from_row, "PlayerRepo::create_player")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::error::DbError;
    use crate::db::repo::{UserRepo, UserRepository};

    async fn setup() -> (UserRepository, PlayerRepository) {
        let db = Arc::new(Db::in_memory().await.unwrap());
        db.init().await.unwrap();
        (UserRepository::new(db.clone()), PlayerRepository::new(db))
    }

    #[tokio::test]
    async fn user_and_player_roundtrip() {
        let (users, players) = setup().await;

        let (user, player) = users
            .create_user_with_player("nova", "$argon2id$fake", "Nova", 0x336699)
            .await
            .unwrap();
        assert_eq!(user.username, "nova");
        assert_eq!(player.user_id, user.id);
        assert_eq!(player.best_score, 0);

        let found = users.get_by_username("nova").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "$argon2id$fake");

        let record = players.get_by_user_id(user.id).await.unwrap().unwrap();
        assert_eq!(record, player);
        assert!(users.get_by_username("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_unique_violation() {
        let (users, _) = setup().await;
        users.create_user("nova", "h").await.unwrap();

        let err = users.create_user("nova", "h").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation));
    }

    #[tokio::test]
    async fn failed_player_insert_rolls_back_user() {
        let db = Arc::new(Db::in_memory().await.unwrap());
        db.init().await.unwrap();
        sqlx::raw_sql(
            "CREATE TRIGGER reject_players BEFORE INSERT ON players BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .execute(db.pool())
        .await
        .unwrap();
        let users = UserRepository::new(db);

        let result = users.create_user_with_player("nova", "h", "Nova", 1).await;
        assert!(result.is_err());
        assert!(users.get_by_username("nova").await.unwrap().is_none());
    }
}
