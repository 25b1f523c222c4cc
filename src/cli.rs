// CLI definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ambience_lights::GroupName;

#[derive(Parser)]
#[command(name = "ambience-lights")]
#[command(author, version, about = "Ambient scene lighting daemon for WiZ smart bulbs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Bulb inventory file (default: ~/.config/ambience/lights.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the lighting daemon on stdin/stdout (JSON lines)
    Daemon(DaemonArgs),

    /// Resolve and validate an animation config file
    Check {
        /// Animation config (JSON)
        file: PathBuf,
    },

    /// Preview an animation config as terminal swatches
    #[command(visible_alias = "pv")]
    Preview {
        /// Animation config (JSON)
        file: PathBuf,
    },

    /// List the bulb inventory
    #[command(visible_alias = "ls")]
    Bulbs,

    /// Send one state to every bulb in a group and report each result
    Set(SetArgs),
}

#[derive(Args)]
pub struct DaemonArgs {
    /// Log bulb commands instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Per-dispatch timeout in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Extra bulb as GROUP=ADDRESS (repeatable)
    #[arg(long = "bulb", value_name = "GROUP=ADDR")]
    pub bulbs: Vec<String>,
}

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("state")
        .required(true)
        .args(["rgb", "scene", "off", "warm_white"]),
))]
pub struct SetArgs {
    /// Target group
    #[arg(value_parser = parse_group)]
    pub group: GroupName,

    /// Color as R,G,B
    #[arg(long, value_parser = parse_rgb, value_name = "R,G,B")]
    pub rgb: Option<[u8; 3]>,

    /// Vendor scene id
    #[arg(long)]
    pub scene: Option<u16>,

    /// Scene speed (10-200)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(10..=200))]
    pub speed: u8,

    /// Warm white (2700K)
    #[arg(long)]
    pub warm_white: bool,

    /// Power off
    #[arg(long)]
    pub off: bool,

    /// Brightness (0-255)
    #[arg(short, long, default_value_t = 255)]
    pub brightness: u8,

    /// Per-dispatch timeout in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

fn parse_group(s: &str) -> Result<GroupName, String> {
    s.parse().map_err(|e: ambience_lights::ConfigError| e.to_string())
}

fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got '{s}'"));
    };
    let channel = |c: &str| {
        c.parse::<u8>()
            .map_err(|_| format!("channel '{c}' is not 0-255"))
    };
    Ok([channel(*r)?, channel(*g)?, channel(*b)?])
}
