pub mod account;

pub use account::{AccountService, LoginResult, RegisterResult};
