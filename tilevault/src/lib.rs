//! TileVault - offline slippy-map tile cache
//!
//! Derives stable storage keys for map tiles, plans the tiles covering a
//! viewport across zoom levels, saves them into a local store and serves
//! them back in place of the network.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator projection and tile coordinates
//! - [`template`] - Tile URL templates (`{s}`, `{x}`, `{y}`, `{z}`, ...)
//! - [`layer`] - Tile source resolution and storage keys
//! - [`planner`] - Bulk tile enumeration for a viewport
//! - [`store`] - Persistence backends and the tile database
//! - [`control`] - Save-area and remove-all actions
//! - [`events`] - Offline action notifications
//! - [`app`] - Application bootstrap from configuration
//! - [`config`] - `~/.tilevault/config.ini`
//! - [`logging`] - Tracing setup

pub mod app;
pub mod config;
pub mod control;
pub mod coord;
pub mod events;
pub mod layer;
pub mod logging;
pub mod planner;
pub mod store;
pub mod template;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
