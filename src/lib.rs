pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod models;
pub mod net;
pub mod services;
pub mod state;
pub mod world;

// Convenient re-exports (so call sites can do `sporeworld::Registry`, etc.)
pub use hub::{Hub, HubLoop, SharedGameObjects};
pub use net::connection::{Client, Connection};
pub use state::{ClientState, registry::Registry};
