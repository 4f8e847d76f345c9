//! Serenity-backed implementation of the moderation surface.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    chrono::{Duration, Utc},
    serenity::{
        all::{CreateMessage, EditMember, Timestamp},
        http::Http,
    },
    tracing::debug,
};

use {
    warden_common::types::{ChannelId, GuildId, MessageId, UserId},
    warden_watchers::{Moderator, Notice},
};

use crate::embed;

/// Moderation actions executed over the Discord HTTP API.
pub struct SerenityModerator {
    http: Arc<Http>,
}

impl SerenityModerator {
    #[must_use]
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Moderator for SerenityModerator {
    async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<()> {
        let embeds: Vec<_> = notice.cards.iter().map(embed::card_embed).collect();
        let builder = CreateMessage::new()
            .content(embed::notice_text(notice))
            .embeds(embeds);
        serenity::all::ChannelId::new(channel.0)
            .send_message(&self.http, builder)
            .await?;
        debug!(channel = %channel, user = %notice.user_id, "posted staff notice");
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild: GuildId,
        user: UserId,
        duration_secs: u64,
        reason: &str,
    ) -> Result<()> {
        let until = Utc::now() + Duration::seconds(duration_secs as i64);
        let timestamp = Timestamp::from_unix_timestamp(until.timestamp())?;
        serenity::all::GuildId::new(guild.0)
            .edit_member(
                &self.http,
                serenity::all::UserId::new(user.0),
                EditMember::new()
                    .disable_communication_until(timestamp.to_string())
                    .audit_log_reason(reason),
            )
            .await?;
        debug!(guild = %guild, user = %user, secs = duration_secs, "timed out member");
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        serenity::all::ChannelId::new(channel.0)
            .delete_message(&self.http, serenity::all::MessageId::new(message.0))
            .await?;
        debug!(channel = %channel, message = %message, "deleted flagged message");
        Ok(())
    }
}
