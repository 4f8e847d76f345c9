//! Staff-notice composition for flagged accounts.

use {
    warden_common::types::MessageAuthor,
    warden_watchers::{MessageCard, Notice},
};

use crate::detector::MessageRecord;

/// Build the notice for a flagged account from the remediation batch.
///
/// One card per flagged channel, carrying the stored message as staff saw it
/// (the messages themselves are deleted right after). Card order follows
/// `records`; callers pass them oldest first.
#[must_use]
pub fn compose(author: &MessageAuthor, records: &[MessageRecord], window_secs: u64) -> Notice {
    let cards = records
        .iter()
        .map(|record| MessageCard {
            author_name: record.author_name.clone(),
            author_avatar_url: record.author_avatar_url.clone(),
            body: record.content.clone(),
            sent_at: record.created_at,
            channel_id: record.channel_id,
        })
        .collect();

    Notice {
        user_id: author.id,
        username: author.username.clone(),
        window_secs,
        channels: records.iter().map(|record| record.channel_id).collect(),
        cards,
    }
}
