//! warden — a channel-fanout moderation watcher for Discord.
//!
//! Loads the config, builds one detector per configured rule, and feeds
//! every inbound gateway message through the watcher registry.

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context as _,
    clap::Parser,
    secrecy::ExposeSecret,
    serenity::{Client, http::Http},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    warden_config::WardenConfig,
    warden_discord::{SerenityModerator, WardenHandler},
    warden_fanout::FanoutDetector,
    warden_watchers::{Moderator, WatcherRegistry},
};

/// How often quiet accounts are swept out of detector memory.
const PURGE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "warden", about = "warden — channel-fanout moderation watcher")]
struct Cli {
    /// Path to the config file (defaults to standard locations).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Build one detector per configured fanout rule.
///
/// A rule that fails to parse or validate is logged and skipped; it never
/// prevents the other rules from initializing.
fn build_watchers(
    cfg: &WardenConfig,
    moderator: &Arc<dyn Moderator>,
) -> (WatcherRegistry, Vec<Arc<FanoutDetector>>) {
    let mut registry = WatcherRegistry::new();
    let mut detectors = Vec::new();

    for (index, rule) in cfg.watchers.fanout.iter().enumerate() {
        match FanoutDetector::from_value(rule, Arc::clone(moderator)) {
            Ok(detector) => {
                let detector = Arc::new(detector);
                info!(
                    rule = index,
                    notification_channel = %detector.settings().notification_channel_id,
                    "registered fanout watcher"
                );
                registry.register(detector.clone());
                detectors.push(detector);
            },
            Err(e) => {
                error!(rule = index, error = %e, "skipping misconfigured fanout rule");
            },
        }
    }

    (registry, detectors)
}

fn spawn_purge_sweeper(detectors: Vec<Arc<FanoutDetector>>) {
    if detectors.is_empty() {
        return;
    }
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PURGE_SWEEP_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            for detector in &detectors {
                detector.purge_expired();
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let cfg = match &cli.config {
        Some(path) => warden_config::load_config(path)?,
        None => warden_config::discover_and_load(),
    };

    let token = cfg.discord.token.expose_secret().clone();
    if token.is_empty() {
        anyhow::bail!("discord token is missing: set [discord].token in the config file");
    }

    let http = Arc::new(Http::new(&token));
    let moderator: Arc<dyn Moderator> = Arc::new(SerenityModerator::new(http));

    let (registry, detectors) = build_watchers(&cfg, &moderator);
    if registry.is_empty() {
        warn!("no watchers configured, the bot will take no action");
    } else {
        info!(watchers = registry.len(), "watchers initialized");
    }

    spawn_purge_sweeper(detectors);

    let handler = WardenHandler::new(Arc::new(registry));
    let mut client = Client::builder(&token, WardenHandler::intents())
        .event_handler(handler)
        .await
        .context("failed to build discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    client
        .start()
        .await
        .context("discord client exited with an error")?;
    Ok(())
}
