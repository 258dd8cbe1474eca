//! Deluge BitTorrent client driver for Dockhand.
//!
//! Installs the `linuxserver/deluge` image as a host-network container with
//! the standard data, config and media bind mounts.

pub mod options;
pub mod plugin;

pub use options::DelugeOptions;
pub use plugin::DelugePlugin;
