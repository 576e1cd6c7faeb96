//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Saved tile statistics
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`plan`] - List the tiles covering a viewport
//! - [`remove`] - Delete every saved tile
//! - [`resolve`] - Show where a tile would be loaded from
//! - [`save`] - Download a viewport for offline use

pub mod cache;
pub mod common;
pub mod config;
pub mod plan;
pub mod remove;
pub mod resolve;
pub mod save;
