pub mod connected;
pub mod hiscores;
pub mod in_game;
pub mod registry;
pub mod session;

pub use connected::Connected;
pub use hiscores::BrowsingHiscores;
pub use in_game::InGame;
pub use session::ClientState;
