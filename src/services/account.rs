use crate::db::error::DbError;
use crate::db::repo::{PlayerRepo, UserRepo};
use crate::error::{LoginError, RegisterError};
use crate::models::account::User;
use crate::models::player::PlayerRecord;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::Arc;

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    players: Arc<dyn PlayerRepo>,
    argon: Argon2<'static>,
}

pub type LoginResult<T> = Result<T, LoginError>;
pub type RegisterResult<T> = Result<T, RegisterError>;

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, players: Arc<dyn PlayerRepo>) -> Self {
        Self::with_hasher(users, players, Argon2::default())
    }

    /// Same service with explicit argon2 parameters. Verification always uses the
    /// parameters stored in the hash itself.
    pub fn with_hasher(users: Arc<dyn UserRepo>, players: Arc<dyn PlayerRepo>, argon: Argon2<'static>) -> Self {
        Self { users, players, argon }
    }

    /// Checks the credentials and loads the player that belongs to the user.
    pub async fn login(&self, username: &str, password: &str) -> LoginResult<PlayerRecord> {
        let folded = User::fold_username(username);

        let Some(user) = self
            .users
            .get_by_username(&folded)
            .await
            .map_err(|e| LoginError::InternalError(format!("cannot look up user: {e}")))?
        else {
            return Err(LoginError::UserNotFound);
        };

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| LoginError::InternalError("cannot parse stored password hash".into()))?;
        if self.argon.verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(LoginError::InvalidPassword);
        }

        match self.players.get_by_user_id(user.id).await {
            Ok(Some(player)) => Ok(player),
            Ok(None) => Err(LoginError::InternalError(format!("no player for user {}", user.id))),
            Err(e) => Err(LoginError::InternalError(format!("cannot load player: {e}"))),
        }
    }

    /// Creates a user and its player. The player keeps the name as typed; the user
    /// row stores it case-folded.
    pub async fn register(&self, username: &str, password: &str, color: i32) -> RegisterResult<PlayerRecord> {
        User::validate_username(username)?;
        let folded = User::fold_username(username);

        match self.users.get_by_username(&folded).await {
            Ok(Some(_)) => return Err(RegisterError::AlreadyExists),
            Ok(None) => {}
            Err(e) => return Err(RegisterError::InternalError(format!("cannot look up user: {e}"))),
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RegisterError::InternalError(format!("cannot hash password: {e}")))?
            .to_string();

        match self.users.create_user_with_player(&folded, &hash, username, color).await {
            Ok((_, player)) => Ok(player),
            // Lost a race against a concurrent registration of the same name
            Err(DbError::UniqueViolation) => Err(RegisterError::AlreadyExists),
            Err(e) => Err(RegisterError::InternalError(format!("cannot create user: {e}"))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::repo::MemoryRepository;
    use crate::error::UsernameError;
    use argon2::{Algorithm, Params, Version};

    /// Cheap argon2 parameters so tests don't spend seconds hashing
    pub(crate) fn light_argon() -> Argon2<'static> {
        let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    pub(crate) fn service() -> AccountService {
        let repo = Arc::new(MemoryRepository::new());
        AccountService::with_hasher(repo.clone(), repo, light_argon())
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = service();
        let created = svc.register("Nova", "hunter2", 42).await.unwrap();
        assert_eq!(created.name, "Nova");
        assert_eq!(created.color, 42);

        let player = svc.login("NOVA", "hunter2").await.unwrap();
        assert_eq!(player, created);
    }

    #[tokio::test]
    async fn login_failures_are_distinguished_internally_only() {
        let svc = service();
        svc.register("nova", "hunter2", 0).await.unwrap();

        assert!(matches!(svc.login("nova", "wrong").await, Err(LoginError::InvalidPassword)));
        assert!(matches!(svc.login("ghost", "hunter2").await, Err(LoginError::UserNotFound)));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_case_insensitively() {
        let svc = service();
        svc.register("Nova", "pw", 0).await.unwrap();

        assert!(matches!(svc.register("nOVA", "pw", 0).await, Err(RegisterError::AlreadyExists)));
    }

    #[tokio::test]
    async fn register_rejects_invalid_names() {
        let svc = service();

        for (name, expected) in [
            ("", UsernameError::Empty),
            ("abcdefghijklmnopqrstu", UsernameError::TooLong),
            (" a", UsernameError::Whitespace),
        ] {
            match svc.register(name, "pw", 0).await {
                Err(RegisterError::InvalidUsername(e)) => assert_eq!(e, expected),
                other => panic!("expected {expected:?} for {name:?}, got {other:?}"),
            }
        }
        assert!(svc.register("ab", "pw", 0).await.is_ok());
    }
}
