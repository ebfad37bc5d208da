pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod tree;
pub mod ui;

pub use error::{Error, Result};

/// Version of s3nav
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
