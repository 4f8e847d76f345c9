use {
    serde::{Deserialize, Serialize},
    warden_common::types::ChannelId,
    warden_watchers::WatchScope,
};

use crate::error::{Error, Result};

/// Configuration for a single fanout rule.
///
/// The host hands each rule to [`crate::FanoutDetector`] as a raw
/// `serde_json::Value`; parsing and validation happen here so a broken rule
/// is rejected without touching any other rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutSettings {
    /// Disabled rules stay registered but never act.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Channel staff notices are posted to.
    pub notification_channel_id: ChannelId,

    /// Minimum distinct channels within the window to flag an account.
    pub channel_threshold: usize,

    /// Window length in seconds.
    pub time_threshold: u64,

    /// How long a flagged account is timed out, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Where the rule applies. Defaults to everywhere.
    #[serde(default)]
    pub scope: WatchScope,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    600
}

impl FanoutSettings {
    /// Parse and validate a raw rule value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let settings: Self = serde_json::from_value(value.clone())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the detector cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.notification_channel_id.0 == 0 {
            return Err(Error::InvalidSetting {
                field: "notification_channel_id",
                reason: "must be a real channel id",
            });
        }
        if self.channel_threshold < 2 {
            // A threshold of 1 would flag every single message.
            return Err(Error::InvalidSetting {
                field: "channel_threshold",
                reason: "must be at least 2",
            });
        }
        if self.time_threshold == 0 {
            return Err(Error::InvalidSetting {
                field: "time_threshold",
                reason: "must be at least 1 second",
            });
        }
        if self.timeout_seconds == 0 {
            return Err(Error::InvalidSetting {
                field: "timeout_seconds",
                reason: "must be at least 1 second",
            });
        }
        Ok(())
    }
}
