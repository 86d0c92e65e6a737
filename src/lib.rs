pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod moderation;
pub mod profiles;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
