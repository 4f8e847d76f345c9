//! Guild/channel scoping shared by all watcher rule settings.

use {
    serde::{Deserialize, Serialize},
    warden_common::types::{ChannelId, ChatMessage, GuildId},
};

/// Where a watcher rule applies.
///
/// Empty lists mean "everywhere" (open policy). `exempt_channels` always
/// wins, so a rule can watch a whole guild while ignoring, say, its own
/// notification channel or a bot-commands channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchScope {
    /// Guilds the rule applies to. Empty = all guilds.
    pub guilds: Vec<GuildId>,
    /// Channels the rule applies to. Empty = all channels.
    pub channels: Vec<ChannelId>,
    /// Channels never watched, regardless of the lists above.
    pub exempt_channels: Vec<ChannelId>,
}

impl WatchScope {
    /// Whether `message` falls inside this scope.
    #[must_use]
    pub fn applies_to(&self, message: &ChatMessage) -> bool {
        if self.exempt_channels.contains(&message.channel_id) {
            return false;
        }

        if !self.guilds.is_empty() {
            match message.guild_id {
                Some(guild) if self.guilds.contains(&guild) => {},
                _ => return false,
            }
        }

        self.channels.is_empty() || self.channels.contains(&message.channel_id)
    }
}
