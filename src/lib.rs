pub mod api;
pub mod auth;
pub mod bot;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod metrics;
