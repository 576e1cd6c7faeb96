//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and app startup to
//! reduce duplication across command handlers.

use std::path::PathBuf;

use tilevault::app::{AppConfig, TileVaultApp};
use tilevault::config::{config_file_path, log_directory, ConfigFile};
use tilevault::control::AlwaysConfirm;
use tilevault::layer::DisplayProfile;
use tilevault::logging::{init_logging, LoggingGuard, DEFAULT_LOG_FILE};
use tracing::info;

use crate::commands::common::PromptConfirm;
use crate::error::CliError;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub device_pixel_ratio: f64,
    pub verbose: bool,
}

impl GlobalOptions {
    /// Config file to read, `--config` or the default location.
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config_file_path)
    }

    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        Ok(ConfigFile::load_from(&self.config_path())?)
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    options: GlobalOptions,
}

impl CliRunner {
    /// Load config and initialize logging.
    pub fn new(options: GlobalOptions) -> Result<Self, CliError> {
        let config = options.load_config()?;

        let logging_guard = init_logging(&log_directory(), DEFAULT_LOG_FILE, options.verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            options,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TileVault v{}", tilevault::VERSION);
        info!("TileVault CLI: {} command", command);
    }

    /// Start the tile cache. `assume_yes` skips the terminal prompts.
    pub async fn start_app(&self, assume_yes: bool) -> Result<TileVaultApp, CliError> {
        if self.options.device_pixel_ratio <= 0.0 {
            return Err(CliError::InvalidInput(format!(
                "device pixel ratio must be positive, got {}",
                self.options.device_pixel_ratio
            )));
        }

        let config = AppConfig::from_config_file(&self.config)
            .with_display(DisplayProfile::new(self.options.device_pixel_ratio));
        let app = TileVaultApp::start(config).await?;

        Ok(if assume_yes {
            app.with_confirm(AlwaysConfirm)
        } else {
            app.with_confirm(PromptConfirm)
        })
    }
}
