//! `solarcalc`: command-line front end for the solar sizing engine.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;

pub use cli::{Cli, Command};
pub use commands::{CommandError, Session};
pub use config::AppConfig;
