//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilevault::app::AppError;
use tilevault::config::ConfigFileError;
use tilevault::control::ControlError;
use tilevault::coord::CoordError;
use tilevault::layer::LayerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read or write the configuration file
    ConfigFile(ConfigFileError),
    /// Failed to start the tile cache
    Startup(AppError),
    /// Invalid coordinates or bounds on the command line
    InvalidInput(String),
    /// A save or remove action failed
    Action(ControlError),
    /// A tile could not be resolved
    Resolve(LayerError),
    /// Failed to serialize output
    Output(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Action(ControlError::BelowMinZoom { min_zoom, .. }) => {
                eprintln!();
                eprintln!(
                    "Zoom in to level {} or deeper, or lower control.min_zoom:",
                    min_zoom
                );
                eprintln!("  tilevault config set control.min_zoom <zoom>");
            }
            CliError::Startup(AppError::StorageOpen(_)) => {
                eprintln!();
                eprintln!("Check that cache.directory is writable:");
                eprintln!("  tilevault config get cache.directory");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Startup(e) => write!(f, "Failed to start tile cache: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Action(e) => write!(f, "{}", e),
            CliError::Resolve(e) => write!(f, "Failed to resolve tile: {}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Startup(e) => Some(e),
            CliError::Action(e) => Some(e),
            CliError::Resolve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Startup(e)
    }
}

impl From<ControlError> for CliError {
    fn from(e: ControlError) -> Self {
        CliError::Action(e)
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Resolve(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidInput(e.to_string())
    }
}
