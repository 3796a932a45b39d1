//! Model onboarding and voice cloning: local asset storage, an optional
//! remote mirror, a file gateway and a speech backend client.

pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use errors::{AppError, AppResult};
pub use state::AppContext;
