//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path` commands
//! for viewing and modifying configuration settings from the command line.

use clap::Subcommand;
use tilevault::config::ConfigKey;

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., control.min_zoom)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., control.min_zoom)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, options: &GlobalOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, options),
        ConfigCommands::Set { key, value } => run_set(&key, &value, options),
        ConfigCommands::List => run_list(options),
        ConfigCommands::Path => {
            println!("{}", options.config_path().display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'tilevault config list' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(key: &str, options: &GlobalOptions) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = options.load_config()?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Set a configuration value.
fn run_set(key: &str, value: &str, options: &GlobalOptions) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = options.load_config()?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save_to(&options.config_path())?;

    println!("Set {} = {}", config_key.name(), value);

    Ok(())
}

/// List all configuration settings.
fn run_list(options: &GlobalOptions) -> Result<(), CliError> {
    let config = options.load_config()?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();

        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }

    if !config.layer.params.is_empty() {
        println!();
        println!("[params]");
        for (name, value) in &config.layer.params {
            println!("  {} = {}", name, value);
        }
    }

    Ok(())
}
