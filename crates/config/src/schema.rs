//! Config schema: Discord credentials plus the watcher rule lists.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub discord: DiscordSection,
    pub watchers: WatchersSection,
}

/// Discord connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSection {
    /// Bot token from the developer portal. Usually supplied as
    /// `token = "${DISCORD_TOKEN}"` and resolved at load time.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl std::fmt::Debug for DiscordSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSection")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Watcher rule lists, one entry per configured rule instance.
///
/// Entries stay raw here; the watcher that owns a rule kind parses and
/// validates its own entries, so a broken rule is skipped without affecting
/// the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchersSection {
    /// Channel-fanout rules.
    pub fanout: Vec<serde_json::Value>,
}
