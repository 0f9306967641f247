//! Kiln - asset build orchestrator
//!
//! Classifies source files, schedules compiler, style compiler and copy
//! subtasks for full builds, and rebuilds single files while watching,
//! cascading into a full stylesheet recompile when class usage changes.

pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestration;
pub mod report;
pub mod ui;
pub mod walker;
pub mod watch;

pub use error::{KilnError, KilnResult};
