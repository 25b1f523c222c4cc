//! Command handlers for the CLI application.
//!
//! - `daemon`: the JSON-lines lighting daemon
//! - `check`: resolve and print an animation config
//! - `preview`: terminal swatch preview of an animation config
//! - `bulbs`: list the bulb inventory
//! - `set`: one-shot state for a group of bulbs

pub mod bulbs;
pub mod check;
pub mod daemon;
pub mod preview;
pub mod set;

use std::path::{Path, PathBuf};

use ambience_lights::{resolve, AnimationConfig, AnimationConfigDef, LightsConfig};
use anyhow::Context;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Inventory path from `--config`, or the default location.
pub fn lights_config_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(LightsConfig::default_path)
}

/// Read, parse and resolve an animation config JSON file.
pub fn load_animation(file: &Path) -> anyhow::Result<AnimationConfig> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let def: AnimationConfigDef =
        serde_json::from_str(&content).with_context(|| format!("parse {}", file.display()))?;
    resolve(&def).with_context(|| format!("resolve {}", file.display()))
}
