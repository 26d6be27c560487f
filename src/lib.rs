pub mod api;
pub mod clients;
pub mod config;
pub mod frontend;
pub mod models;
pub mod relay;
pub mod security;
pub mod utils;
