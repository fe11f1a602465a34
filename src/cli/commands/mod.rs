pub mod assist;
pub mod config;
pub mod health;
pub mod providers;
pub mod status;
