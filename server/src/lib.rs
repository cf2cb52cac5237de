pub mod auth;
pub mod chat;
pub mod components;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod models;
pub mod password;
pub mod routes;
pub mod setup;
pub mod state;
pub mod static_assets;
pub mod storage;
pub mod user;

pub use state::AppState;
