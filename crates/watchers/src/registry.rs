use std::sync::Arc;

use {tracing::warn, warden_common::types::ChatMessage};

use crate::watcher::Watcher;

/// Registry of all active watcher rules.
///
/// Dispatch runs watchers in registration order; a failing watcher is logged
/// and never prevents the remaining watchers from seeing the message.
#[derive(Default)]
pub struct WatcherRegistry {
    watchers: Vec<Arc<dyn Watcher>>,
}

impl WatcherRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            watchers: Vec::new(),
        }
    }

    pub fn register(&mut self, watcher: Arc<dyn Watcher>) {
        self.watchers.push(watcher);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.watchers.iter().map(|w| w.name()).collect()
    }

    /// Offer `message` to every watcher whose `should_act` returns true.
    pub async fn dispatch(&self, message: &ChatMessage) {
        for watcher in &self.watchers {
            if !watcher.should_act(message) {
                continue;
            }
            if let Err(e) = watcher.act(message).await {
                warn!(
                    watcher = watcher.name(),
                    message_id = %message.id,
                    error = %e,
                    "watcher failed to handle message"
                );
            }
        }
    }
}
