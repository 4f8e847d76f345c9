//! Moderation surface of the chat platform.
//!
//! Watchers remediate through this trait instead of a concrete client, so
//! detectors stay platform-free and tests can record calls with a fake.
//! The platform crate maps [`Notice`] to its own presentation format.

use {
    anyhow::Result,
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::Serialize,
    warden_common::types::{ChannelId, GuildId, MessageId, UserId},
};

/// A per-channel summary attached to a staff notice: the last stored message
/// the flagged account sent in that channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageCard {
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub channel_id: ChannelId,
}

/// A staff notification about a flagged account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub user_id: UserId,
    pub username: String,
    /// Seconds of the detection window the account was flagged within.
    pub window_secs: u64,
    /// Channels with a live entry at flag time, one card each.
    pub channels: Vec<ChannelId>,
    pub cards: Vec<MessageCard>,
}

/// Moderation actions a watcher may request from the platform.
///
/// Every method is best-effort from the caller's point of view: watchers log
/// and swallow failures so one failed action never blocks the next.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Post a staff notice to the given channel.
    async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<()>;

    /// Time the account out for `duration_secs`, with an audit reason.
    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        duration_secs: u64,
        reason: &str,
    ) -> Result<()>;

    /// Delete a single message by reference.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;
}
