pub mod app;
pub mod config;
pub mod error;
pub mod foods;
pub mod nutrition;
pub mod providers;
pub mod state;
pub mod vision;
