pub mod client;
pub mod config;
pub mod conversation;
pub mod message;
pub mod push;
pub mod team;
pub mod types;
