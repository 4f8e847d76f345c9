//! Notice rendering: body text plus one embed per flagged channel.

use {
    serenity::all::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Timestamp},
    warden_watchers::{MessageCard, Notice},
};

/// Discord caps embed descriptions at 4096 characters.
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Render the notice body posted alongside the cards.
#[must_use]
pub fn notice_text(notice: &Notice) -> String {
    let channels = notice
        .channels
        .iter()
        .map(|c| format!("<#{c}>"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "User <@{}> ({}) flagged as automated spam: posted in {} channels within {} seconds: {}",
        notice.user_id,
        notice.username,
        notice.channels.len(),
        notice.window_secs,
        channels
    )
}

/// One embed per flagged channel, summarizing the stored message as staff
/// saw it before deletion.
#[must_use]
pub fn card_embed(card: &MessageCard) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(&card.author_name);
    if let Some(url) = &card.author_avatar_url {
        author = author.icon_url(url);
    }

    let mut embed = CreateEmbed::new()
        .description(truncate(&card.body, EMBED_DESCRIPTION_LIMIT))
        .author(author)
        .footer(CreateEmbedFooter::new(format!(
            "Sent in <#{}>",
            card.channel_id
        )));

    if let Ok(ts) = Timestamp::from_unix_timestamp(card.sent_at.timestamp()) {
        embed = embed.timestamp(ts);
    }

    embed
}

/// Truncate to `max` characters on a char boundary, with a trailing
/// ellipsis when anything was cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let mut cut: String = text.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}
