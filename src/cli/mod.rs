//! Command-line host for the caching controller

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
