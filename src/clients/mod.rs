pub mod discord;
pub mod health;
pub mod rebuild;
pub mod redis;
pub mod store;
