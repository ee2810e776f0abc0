pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod id;
pub mod models;
pub mod search;
pub mod store;
