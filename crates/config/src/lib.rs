//! Configuration for the warden bot.
//!
//! A single config file (`warden.{toml,yaml,yml,json}`) carries the Discord
//! credentials and the list of watcher rules. Rule tables are kept as raw
//! values here; each watcher validates its own rules, so one broken rule
//! never takes down the rest.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{discover_and_load, load_config},
    schema::WardenConfig,
};
