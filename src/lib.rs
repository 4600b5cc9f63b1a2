pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod lms;
pub mod models;
pub mod projection;
pub mod services;
pub mod session;
pub mod state;
pub mod views;
