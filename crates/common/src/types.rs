//! Platform-generic message types.
//!
//! The Discord glue converts client-library values into these types at the
//! gateway boundary, so watchers and detectors never depend on a specific
//! chat-platform client.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Snowflake id of an account.
    UserId
);
id_type!(
    /// Snowflake id of a channel.
    ChannelId
);
id_type!(
    /// Snowflake id of a message.
    MessageId
);
id_type!(
    /// Snowflake id of a guild (server).
    GuildId
);

/// The account that sent a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: UserId,
    /// Account username (unique handle).
    pub username: String,
    /// Server-specific or global display name, when set.
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Whether the platform marks this account as a bot.
    pub bot: bool,
}

impl MessageAuthor {
    /// Preferred human-readable name: display name when present, username
    /// otherwise.
    #[must_use]
    pub fn visible_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// A single inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Absent for direct messages.
    pub guild_id: Option<GuildId>,
    pub author: MessageAuthor,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
