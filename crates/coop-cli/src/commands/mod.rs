pub mod common;
pub mod completions;
pub mod config;
pub mod fowl;
pub mod sync;
pub mod transfer;
