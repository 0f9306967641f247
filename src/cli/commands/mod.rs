//! CLI command implementations

pub mod build;
pub mod cache;
pub mod config;
pub mod watch;

pub use build::execute as build;
pub use cache::execute as cache;
pub use config::execute as config;
pub use watch::execute as watch;
