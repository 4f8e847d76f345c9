//! Discord gateway event handler.

use std::sync::Arc;

use {
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Message, Ready},
        async_trait,
    },
    tracing::{debug, info},
};

use {
    warden_common::types::{ChannelId, ChatMessage, GuildId, MessageAuthor, MessageId, UserId},
    warden_watchers::WatcherRegistry,
};

/// Handler for Discord gateway events.
pub struct WardenHandler {
    registry: Arc<WatcherRegistry>,
}

impl WardenHandler {
    #[must_use]
    pub fn new(registry: Arc<WatcherRegistry>) -> Self {
        Self { registry }
    }

    /// Required gateway intents for the bot.
    #[must_use]
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

/// Convert a serenity message into the platform-generic shape watchers see.
fn to_chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        id: MessageId(msg.id.get()),
        channel_id: ChannelId(msg.channel_id.get()),
        guild_id: msg.guild_id.map(|g| GuildId(g.get())),
        author: MessageAuthor {
            id: UserId(msg.author.id.get()),
            username: msg.author.name.clone(),
            display_name: msg.author.global_name.clone(),
            avatar_url: msg.author.avatar_url(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        // Fall back to arrival time if the snowflake timestamp is unusable.
        created_at: chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(chrono::Utc::now),
    }
}

#[async_trait]
impl EventHandler for WardenHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot = %ready.user.name,
            guilds = ready.guilds.len(),
            watchers = self.registry.len(),
            "discord gateway ready"
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops.
        if msg.author.bot {
            return;
        }

        let message = to_chat_message(&msg);
        debug!(
            message_id = %message.id,
            user = %message.author.id,
            channel = %message.channel_id,
            "inbound message"
        );
        self.registry.dispatch(&message).await;
    }
}
