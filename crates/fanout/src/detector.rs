//! The fanout detector: per-account sliding window over distinct channels.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use {
    anyhow::Result,
    async_trait::async_trait,
    chrono::{DateTime, Duration, Utc},
    tracing::{debug, info, warn},
    warden_common::types::{ChannelId, ChatMessage, MessageId, UserId},
    warden_watchers::{Moderator, Watcher},
};

use crate::{notice, settings::FanoutSettings, window::WindowedMultimap};

/// The last message an account sent in a given channel, kept for expiry
/// comparison and for the remediation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for MessageRecord {
    fn from(message: &ChatMessage) -> Self {
        Self {
            message_id: message.id,
            channel_id: message.channel_id,
            author_name: message.author.visible_name().to_owned(),
            author_avatar_url: message.author.avatar_url.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// What [`FanoutDetector::handle_message`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Recorded; the account stays below the threshold.
    Tracked,
    /// Threshold crossed: remediation was attempted and the account's
    /// tracked state cleared.
    Flagged { channels: usize },
}

/// Watches for accounts posting across many channels in a short window.
///
/// State is a per-account map from channel to the last message seen there,
/// purged lazily on every evaluation. The mutex guards synchronous map
/// operations only and is never held across an `.await`; remediation runs on
/// a snapshot taken at flag time.
pub struct FanoutDetector {
    settings: FanoutSettings,
    moderator: Arc<dyn Moderator>,
    activity: Mutex<WindowedMultimap<UserId, ChannelId, MessageRecord>>,
}

impl FanoutDetector {
    pub fn new(settings: FanoutSettings, moderator: Arc<dyn Moderator>) -> crate::Result<Self> {
        settings.validate()?;
        let window = Duration::seconds(settings.time_threshold as i64);
        Ok(Self {
            settings,
            moderator,
            activity: Mutex::new(WindowedMultimap::new(window)),
        })
    }

    /// Build a detector from a raw rule value, validating it first.
    pub fn from_value(
        value: &serde_json::Value,
        moderator: Arc<dyn Moderator>,
    ) -> crate::Result<Self> {
        let settings = FanoutSettings::from_value(value)?;
        Self::new(settings, moderator)
    }

    #[must_use]
    pub fn settings(&self) -> &FanoutSettings {
        &self.settings
    }

    /// Store `message` for its (author, channel) pair, overwriting any
    /// earlier message in the same channel. Safe to call for upstream
    /// duplicates and retries.
    pub fn record(&self, message: &ChatMessage) {
        debug!(
            message_id = %message.id,
            user = %message.author.id,
            channel = %message.channel_id,
            "recording message"
        );
        self.lock_activity().insert(
            message.author.id,
            message.channel_id,
            MessageRecord::from(message),
            message.created_at,
        );
    }

    /// Drop expired entries for every tracked account. Evaluation already
    /// purges the account it looks at; this sweep keeps accounts that went
    /// quiet from lingering.
    pub fn purge_expired(&self) {
        self.lock_activity().purge(Utc::now());
    }

    /// Drop expired entries for a single account.
    pub fn purge_expired_for(&self, user: UserId) {
        self.lock_activity().purge_key(&user, Utc::now());
    }

    /// Whether `user` currently has live entries in at least
    /// `channel_threshold` distinct channels. Purges the account first.
    #[must_use]
    pub fn is_above_threshold(&self, user: UserId) -> bool {
        self.is_above_threshold_at(user, Utc::now())
    }

    fn is_above_threshold_at(&self, user: UserId, now: DateTime<Utc>) -> bool {
        let mut activity = self.lock_activity();
        if !activity.contains_key(&user) {
            return false;
        }
        activity.live_count(&user, now) >= self.settings.channel_threshold
    }

    /// Record `message` and remediate if the author just crossed the
    /// threshold. Remediation is best-effort throughout: each step is
    /// attempted independently and failures are logged and swallowed.
    pub async fn handle_message(&self, message: &ChatMessage) -> Outcome {
        self.handle_message_at(message, Utc::now()).await
    }

    async fn handle_message_at(&self, message: &ChatMessage, now: DateTime<Utc>) -> Outcome {
        let user = message.author.id;

        let flagged = {
            let mut activity = self.lock_activity();
            activity.insert(
                user,
                message.channel_id,
                MessageRecord::from(message),
                message.created_at,
            );
            if activity.live_count(&user, now) >= self.settings.channel_threshold {
                let mut records = activity.snapshot(&user);
                records.sort_by_key(|record| (record.created_at, record.channel_id));
                Some(records)
            } else {
                None
            }
        };

        let Some(records) = flagged else {
            return Outcome::Tracked;
        };

        info!(
            user = %user,
            username = %message.author.username,
            channels = records.len(),
            window_secs = self.settings.time_threshold,
            "account crossed channel fanout threshold"
        );

        self.remediate(message, &records).await;

        // Cleared only after every remediation attempt has been issued, so a
        // fresh tracking window starts from nothing.
        self.lock_activity().remove(&user);
        debug!(user = %user, "cleared tracked activity");

        Outcome::Flagged {
            channels: records.len(),
        }
    }

    async fn remediate(&self, message: &ChatMessage, records: &[MessageRecord]) {
        let user = message.author.id;

        let notice = notice::compose(&message.author, records, self.settings.time_threshold);
        if let Err(e) = self
            .moderator
            .post_notice(self.settings.notification_channel_id, &notice)
            .await
        {
            warn!(
                user = %user,
                channel = %self.settings.notification_channel_id,
                error = %e,
                "failed to post staff notice"
            );
        }

        let reason = format!(
            "Flagged for channel fanout: posted in {} channels within {} seconds",
            records.len(),
            self.settings.time_threshold
        );
        match message.guild_id {
            Some(guild) => {
                if let Err(e) = self
                    .moderator
                    .timeout_member(guild, user, self.settings.timeout_seconds, &reason)
                    .await
                {
                    warn!(
                        user = %user,
                        guild = %guild,
                        error = %e,
                        "failed to time out flagged account"
                    );
                }
            },
            None => {
                warn!(user = %user, "flagged account outside a guild, skipping timeout");
            },
        }

        for record in records {
            if let Err(e) = self
                .moderator
                .delete_message(record.channel_id, record.message_id)
                .await
            {
                warn!(
                    user = %user,
                    channel = %record.channel_id,
                    message = %record.message_id,
                    error = %e,
                    "failed to delete flagged message"
                );
            }
        }
    }

    fn lock_activity(
        &self,
    ) -> MutexGuard<'_, WindowedMultimap<UserId, ChannelId, MessageRecord>> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Watcher for FanoutDetector {
    fn name(&self) -> &str {
        "fanout"
    }

    fn should_act(&self, message: &ChatMessage) -> bool {
        self.settings.enabled
            && !message.author.bot
            && message.channel_id != self.settings.notification_channel_id
            && self.settings.scope.applies_to(message)
    }

    async fn act(&self, message: &ChatMessage) -> Result<()> {
        self.handle_message(message).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        warden_common::types::{GuildId, MessageAuthor},
        warden_watchers::Notice,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Notice {
            channel: ChannelId,
            user: UserId,
            channels: Vec<ChannelId>,
            cards: usize,
        },
        Timeout {
            guild: GuildId,
            user: UserId,
            secs: u64,
            reason: String,
        },
        Delete {
            channel: ChannelId,
            message: MessageId,
        },
    }

    /// Records every moderation call; optionally fails after recording the
    /// attempt, to exercise the best-effort path.
    #[derive(Default)]
    struct FakeModerator {
        calls: Mutex<Vec<Call>>,
        fail_notice: bool,
        fail_deletes: bool,
    }

    impl FakeModerator {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Moderator for FakeModerator {
        async fn post_notice(&self, channel: ChannelId, notice: &Notice) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Notice {
                channel,
                user: notice.user_id,
                channels: notice.channels.clone(),
                cards: notice.cards.len(),
            });
            if self.fail_notice {
                anyhow::bail!("missing permissions");
            }
            Ok(())
        }

        async fn timeout_member(
            &self,
            guild: GuildId,
            user: UserId,
            duration_secs: u64,
            reason: &str,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Timeout {
                guild,
                user,
                secs: duration_secs,
                reason: reason.to_owned(),
            });
            Ok(())
        }

        async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete { channel, message });
            if self.fail_deletes {
                anyhow::bail!("message already deleted");
            }
            Ok(())
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn msg_in(guild: Option<u64>, channel: u64, secs: i64) -> ChatMessage {
        ChatMessage {
            id: MessageId(channel * 1000 + secs as u64),
            channel_id: ChannelId(channel),
            guild_id: guild.map(GuildId),
            author: MessageAuthor {
                id: UserId(42),
                username: "spam_account".into(),
                display_name: None,
                avatar_url: None,
                bot: false,
            },
            content: "buy cheap nitro".into(),
            created_at: t(secs),
        }
    }

    fn msg(channel: u64, secs: i64) -> ChatMessage {
        msg_in(Some(1), channel, secs)
    }

    fn detector(moderator: Arc<FakeModerator>) -> FanoutDetector {
        FanoutDetector::new(
            FanoutSettings::from_value(&json!({
                "notification_channel_id": 555,
                "channel_threshold": 3,
                "time_threshold": 60,
            }))
            .unwrap(),
            moderator,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn third_channel_triggers_full_remediation() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        assert_eq!(d.handle_message_at(&msg(10, 0), t(0)).await, Outcome::Tracked);
        assert_eq!(d.handle_message_at(&msg(20, 5), t(5)).await, Outcome::Tracked);
        assert_eq!(
            d.handle_message_at(&msg(30, 10), t(10)).await,
            Outcome::Flagged { channels: 3 }
        );

        assert_eq!(moderator.calls(), vec![
            Call::Notice {
                channel: ChannelId(555),
                user: UserId(42),
                channels: vec![ChannelId(10), ChannelId(20), ChannelId(30)],
                cards: 3,
            },
            Call::Timeout {
                guild: GuildId(1),
                user: UserId(42),
                secs: 600,
                reason: "Flagged for channel fanout: posted in 3 channels within 60 seconds"
                    .into(),
            },
            Call::Delete {
                channel: ChannelId(10),
                message: MessageId(10_000),
            },
            Call::Delete {
                channel: ChannelId(20),
                message: MessageId(20_005),
            },
            Call::Delete {
                channel: ChannelId(30),
                message: MessageId(30_010),
            },
        ]);

        // State is gone: the account reads as CLEAN again.
        assert!(!d.is_above_threshold_at(UserId(42), t(10)));
        assert!(!d.lock_activity().contains_key(&UserId(42)));
    }

    #[tokio::test]
    async fn two_channels_stay_tracking() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        d.handle_message_at(&msg(20, 5), t(5)).await;

        assert!(moderator.calls().is_empty());
        assert!(!d.is_above_threshold_at(UserId(42), t(5)));
        assert!(d.lock_activity().contains_key(&UserId(42)));
    }

    #[tokio::test]
    async fn stale_entries_do_not_count_toward_the_threshold() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        d.handle_message_at(&msg(20, 0), t(0)).await;
        // Both t=0 entries fall outside the 60s window by t=61.
        assert_eq!(
            d.handle_message_at(&msg(30, 61), t(61)).await,
            Outcome::Tracked
        );

        assert!(moderator.calls().is_empty());
    }

    #[tokio::test]
    async fn same_channel_overwrites_and_deletes_the_latest_message() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        // Second message in channel 10 overwrites, count stays 1.
        assert_eq!(d.handle_message_at(&msg(10, 5), t(5)).await, Outcome::Tracked);
        d.handle_message_at(&msg(20, 8), t(8)).await;
        assert_eq!(
            d.handle_message_at(&msg(30, 9), t(9)).await,
            Outcome::Flagged { channels: 3 }
        );

        let deletes: Vec<Call> = moderator
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Delete { .. }))
            .collect();
        assert_eq!(deletes, vec![
            Call::Delete {
                channel: ChannelId(10),
                message: MessageId(10_005),
            },
            Call::Delete {
                channel: ChannelId(20),
                message: MessageId(20_008),
            },
            Call::Delete {
                channel: ChannelId(30),
                message: MessageId(30_009),
            },
        ]);
    }

    #[tokio::test]
    async fn cleared_account_starts_a_fresh_window() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        d.handle_message_at(&msg(20, 5), t(5)).await;
        d.handle_message_at(&msg(30, 10), t(10)).await;

        // No residual suspicion: the next message counts from one again.
        assert_eq!(
            d.handle_message_at(&msg(40, 20), t(20)).await,
            Outcome::Tracked
        );
        d.handle_message_at(&msg(50, 21), t(21)).await;
        assert_eq!(
            d.handle_message_at(&msg(60, 22), t(22)).await,
            Outcome::Flagged { channels: 3 }
        );

        let second_flag_deletes: Vec<ChannelId> = moderator
            .calls()
            .into_iter()
            .skip(5)
            .filter_map(|c| match c {
                Call::Delete { channel, .. } => Some(channel),
                _ => None,
            })
            .collect();
        assert_eq!(
            second_flag_deletes,
            vec![ChannelId(40), ChannelId(50), ChannelId(60)]
        );
    }

    #[tokio::test]
    async fn failed_notice_does_not_stop_timeout_or_deletes() {
        let moderator = Arc::new(FakeModerator {
            fail_notice: true,
            ..Default::default()
        });
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        d.handle_message_at(&msg(20, 5), t(5)).await;
        let outcome = d.handle_message_at(&msg(30, 10), t(10)).await;

        assert_eq!(outcome, Outcome::Flagged { channels: 3 });
        let calls = moderator.calls();
        assert_eq!(calls.len(), 5);
        assert!(matches!(calls[1], Call::Timeout { .. }));
        // State still cleared even though remediation partly failed.
        assert!(!d.lock_activity().contains_key(&UserId(42)));
    }

    #[tokio::test]
    async fn failed_deletes_do_not_stop_each_other() {
        let moderator = Arc::new(FakeModerator {
            fail_deletes: true,
            ..Default::default()
        });
        let d = detector(moderator.clone());

        d.handle_message_at(&msg(10, 0), t(0)).await;
        d.handle_message_at(&msg(20, 5), t(5)).await;
        d.handle_message_at(&msg(30, 10), t(10)).await;

        let delete_count = moderator
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Delete { .. }))
            .count();
        assert_eq!(delete_count, 3);
    }

    #[tokio::test]
    async fn dm_flag_skips_the_timeout() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());

        d.handle_message_at(&msg_in(None, 10, 0), t(0)).await;
        d.handle_message_at(&msg_in(None, 20, 5), t(5)).await;
        d.handle_message_at(&msg_in(None, 30, 10), t(10)).await;

        let calls = moderator.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| !matches!(c, Call::Timeout { .. })));
    }

    #[tokio::test]
    async fn record_and_is_above_threshold_compose() {
        let moderator = FakeModerator::new();
        let d = detector(moderator);

        // Duplicate deliveries of the same channel keep the count at one.
        d.record(&msg(10, 0));
        d.record(&msg(10, 1));
        assert!(!d.is_above_threshold_at(UserId(42), t(1)));

        d.record(&msg(20, 2));
        d.record(&msg(30, 3));
        assert!(d.is_above_threshold_at(UserId(42), t(3)));
        assert!(!d.is_above_threshold_at(UserId(7), t(3)));
    }

    #[tokio::test]
    async fn purge_expired_forgets_quiet_accounts() {
        let moderator = FakeModerator::new();
        let d = detector(moderator);

        // Fixture timestamps are far in the past relative to the wall clock.
        d.record(&msg(10, 0));
        assert!(d.lock_activity().contains_key(&UserId(42)));
        d.purge_expired();
        assert!(!d.lock_activity().contains_key(&UserId(42)));

        d.record(&msg(10, 0));
        d.purge_expired_for(UserId(42));
        assert!(!d.lock_activity().contains_key(&UserId(42)));
    }

    #[test]
    fn should_act_gates_on_settings_and_author() {
        let moderator = FakeModerator::new();
        let d = detector(moderator.clone());
        assert!(d.should_act(&msg(10, 0)));

        // Messages in the notification channel itself are never watched.
        assert!(!d.should_act(&msg(555, 0)));

        let mut from_bot = msg(10, 0);
        from_bot.author.bot = true;
        assert!(!d.should_act(&from_bot));

        let disabled = FanoutDetector::new(
            FanoutSettings {
                enabled: false,
                ..d.settings().clone()
            },
            moderator.clone(),
        )
        .unwrap();
        assert!(!disabled.should_act(&msg(10, 0)));

        let scoped = FanoutDetector::new(
            FanoutSettings {
                scope: warden_watchers::WatchScope {
                    guilds: vec![GuildId(9)],
                    ..Default::default()
                },
                ..d.settings().clone()
            },
            moderator,
        )
        .unwrap();
        assert!(!scoped.should_act(&msg(10, 0)));
        assert!(scoped.should_act(&msg_in(Some(9), 10, 0)));
    }

    #[test]
    fn from_value_rejects_broken_rules() {
        let moderator = FakeModerator::new();
        let err = FanoutDetector::from_value(&json!({"channel_threshold": 3}), moderator);
        assert!(err.is_err());
    }
}
