use crate::db::repo::UserRepo;
use crate::db::{Db, DbResult, map_row, map_row_opt};
use crate::models::account::User;
use crate::models::player::PlayerRecord;
use std::sync::Arc;

pub struct UserRepository {
    db: Arc<Db>,
}

impl UserRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl UserRepo for UserRepository {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row_opt = sqlx::query("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.db.pool)
            .await?;

        map_row_opt(
            row_opt,
            User::try_from_row,
            &format!("UserRepo::get_by_username username={}", username),
        )
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .fetch_one(&self.db.pool)
        .await?;

        map_row(&row, User::try_from_row, "UserRepo::create_user")
    }

    async fn create_user_with_player(
        &self,
        username: &str,
        password_hash: &str,
        player_name: &str,
        color: i32,
    ) -> DbResult<(User, PlayerRecord)> {
        let mut tx = self.db.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        let user = map_row(&row, User::try_from_row, "UserRepo::create_user_with_player user")?;

        let row = sqlx::query(
            r#"
            INSERT INTO players (user_id, name, color)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, name, best_score, color
            "#,
        )
        .bind(user.id)
        .bind(player_name)
        .bind(color)
        .fetch_one(&mut *tx)
        .await?;
        let player = map_row(&row, PlayerRecord::try_from_row, "UserRepo::create_user_with_player player")?;

        // Dropping `tx` before this point rolls both inserts back
        tx.commit().await?;

        Ok((user, player))
    }
}
