use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context as _, Error, Result},
    schema::WardenConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["warden.toml", "warden.yaml", "warden.yml", "warden.json"];

/// Load config from the given path (any supported format), with env
/// substitution applied before parsing.
pub fn load_config(path: &Path) -> Result<WardenConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context_path("failed to read config", path)?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./warden.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/warden/warden.{toml,yaml,yml,json}` (user-global)
///
/// Returns `WardenConfig::default()` if no config file is found or the file
/// fails to load; the failure is logged, not fatal.
#[must_use]
pub fn discover_and_load() -> WardenConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    WardenConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "warden") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> Result<WardenConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).with_context_path("invalid TOML config", path),
        "yaml" | "yml" => serde_yaml::from_str(raw).with_context_path("invalid YAML config", path),
        "json" => serde_json::from_str(raw).with_context_path("invalid JSON config", path),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

trait PathContext<T> {
    fn with_context_path(self, context: &str, path: &Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> PathContext<T> for std::result::Result<T, E> {
    fn with_context_path(self, context: &str, path: &Path) -> Result<T> {
        self.context(format!("{context} ({})", path.display()))
    }
}
