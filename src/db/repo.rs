mod memory;
mod player;
mod player_db;
mod user;
mod user_db;

pub use memory::MemoryRepository;
pub use player_db::PlayerRepository;
pub use user_db::UserRepository;

pub use player::PlayerRepo;
pub use user::UserRepo;
