#![forbid(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod export;
pub mod record;
pub mod report;
pub mod sheet;

pub use cli::app::{Cli, Command};
