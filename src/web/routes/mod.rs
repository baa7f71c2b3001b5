// Route handler modules

pub mod config;
pub mod files;
pub mod generate;
pub mod health;
pub mod static_files;
