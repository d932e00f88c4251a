// src/config.rs
//! Configuration structures for the notification scheduler.
//!
//! Deserialized from a JSON file when one is given; every field has a
//! sensible default, so a missing file or a partial one is fine.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Process-wide default configuration, for callers that don't load a file.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::default);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Scheduler pacing settings.
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause between the displays of one revision group, so the display
    /// surface renders each step smoothly.
    pub settle_delay_ms: u64,
    /// Slack added on top of a displayed message's timeout before the next
    /// unrelated message may be shown.
    pub wait_epsilon_ms: u64,
    /// On-screen duration for submissions that don't request one.
    pub default_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            settle_delay_ms: 250,
            wait_epsilon_ms: 100,
            default_timeout_ms: 6000,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
