// SPDX-License-Identifier: MIT OR Apache-2.0

//! Game model configuration

use crate::history::DEFAULT_MAX_HISTORY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Undo entries kept before the oldest is evicted
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Reject moves by the side not on turn
    #[serde(default)]
    pub strict_turns: bool,
    /// Handicap stones given to Black; White then plays first
    #[serde(default)]
    pub handicap: u8,
    /// Resolved positions kept for faster navigation
    #[serde(default = "default_resolve_cache")]
    pub resolve_cache: usize,
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_resolve_cache() -> usize {
    64
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            strict_turns: false,
            handicap: 0,
            resolve_cache: default_resolve_cache(),
        }
    }
}

impl ModelConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse model config")
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }
}
