//! Discord glue for warden.
//!
//! Implements the gateway event handler that feeds inbound messages to the
//! watcher registry, and the serenity-backed moderation surface watchers
//! remediate through.

pub mod embed;
pub mod handler;
pub mod moderator;

pub use {handler::WardenHandler, moderator::SerenityModerator};
