use {anyhow::Result, async_trait::async_trait, warden_common::types::ChatMessage};

/// Core watcher trait. Each moderation rule implements this.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Stable identifier used in logs (e.g. "fanout").
    fn name(&self) -> &str;

    /// Whether this watcher wants to handle `message`.
    ///
    /// Implementations check their enabled flag and scope here; the registry
    /// never calls [`Watcher::act`] when this returns false.
    fn should_act(&self, message: &ChatMessage) -> bool;

    /// Handle a message this watcher elected to act on.
    async fn act(&self, message: &ChatMessage) -> Result<()>;
}
