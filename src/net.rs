pub mod connection;
pub mod http;
pub mod packets;
pub mod sink;
