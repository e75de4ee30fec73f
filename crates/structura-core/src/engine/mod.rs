pub mod config;
pub mod error;
pub mod progress;
pub mod structure;
pub mod tasks;
