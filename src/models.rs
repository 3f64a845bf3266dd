pub mod account;
pub mod player;
pub mod spore;
pub mod types;
