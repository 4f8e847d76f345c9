//! Watcher host contract for warden.
//!
//! A watcher is a moderation rule that inspects every inbound message and may
//! take action. This crate defines the capability traits at the seams (the
//! [`Watcher`] rule contract and the [`Moderator`] platform surface), the
//! registry that dispatches messages to rules, and the guild/channel scoping
//! shared by all rule settings.

pub mod moderation;
pub mod registry;
pub mod scope;
pub mod watcher;

pub use {
    moderation::{MessageCard, Moderator, Notice},
    registry::WatcherRegistry,
    scope::WatchScope,
    watcher::Watcher,
};
