//! Logging setup and the logger handle passed to operations.

use std::fmt::Display;

/// Initialises `env_logger` for the command-line front end.
///
/// `RUST_LOG` still takes precedence over the flags.
pub fn init_logger(verbose: bool, quiet: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else if quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();
}

/// Fire-and-forget logging handle used by the engine and handed to custom
/// operations through their context.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!("{message}");
    }

    pub fn info(&self, message: impl Display) {
        log::info!("{message}");
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!("{message}");
    }

    pub fn error(&self, message: impl Display) {
        log::error!("{message}");
    }

    /// Prints a user-facing result line such as `create: 'src/lib.rs'`.
    ///
    /// Suppressed whenever the info level is disabled.
    pub fn success(&self, message: impl Display) {
        if log::log_enabled!(log::Level::Info) {
            println!("{message}");
        }
    }
}
