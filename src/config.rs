//! Configuration loading from skillgraph.toml.
//!
//! A standalone `skillgraph.toml` next to the working directory provides
//! defaults for the tunables; CLI flags override it, built-in defaults
//! apply when neither is given.
//!
//! ## Example
//!
//! ```toml
//! topk = 10
//! checkpoint-every = 100
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default number of skill candidates kept per document.
pub const DEFAULT_TOPK: usize = 10;
/// Default checkpoint interval in records.
pub const DEFAULT_CHECKPOINT_EVERY: usize = 100;

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,
    /// Skill candidates kept per document.
    pub topk: usize,
    /// Records between graph checkpoints.
    pub checkpoint_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            topk: DEFAULT_TOPK,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    topk: Option<usize>,
    checkpoint_every: Option<usize>,
}

impl Config {
    /// Load configuration from `skillgraph.toml` in the given directory,
    /// falling back to defaults when the file is absent or unreadable.
    pub fn load(directory: &Path) -> Self {
        let path = directory.join("skillgraph.toml");
        if path.exists() {
            if let Some(config) = Self::load_toml(&path) {
                return config;
            }
        }
        Self::default()
    }

    fn load_toml(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let raw: RawConfig = toml::from_str(&content).ok()?;
        Some(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        Self {
            source: Some(source),
            topk: raw.topk.unwrap_or(DEFAULT_TOPK),
            checkpoint_every: raw.checkpoint_every.unwrap_or(DEFAULT_CHECKPOINT_EVERY),
        }
    }
}
