pub mod embed;
pub mod event;
pub mod health;
pub mod rebuild;
pub mod response;
pub mod status;
