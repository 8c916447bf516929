//! Storage infrastructure: configuration and settings persistence.
//!
//! - **`config`**   – The TOML configuration file (ports, drift thresholds,
//!   displays), read at start-up with defaults for anything missing.
//! - **`settings`** – A small JSON file of operator preferences that change
//!   while the app runs (e.g. the verse font size).

pub mod config;
pub mod settings;
