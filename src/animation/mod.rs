//! Animation configuration and the randomized light model.
//!
//! Configs arrive as JSON (already shaped by the environment loader) and are
//! resolved into an immutable [`AnimationConfig`]: inheritance between
//! groups is flattened into concrete copies and every numeric field is
//! range-checked, so the animation loops never see an unresolved group.
//!
//! # Example config
//!
//! ```json
//! {
//!   "cycletime": 12,
//!   "groups": {
//!     "backdrop":    { "type": "rgb", "rgb": { "base": [255, 80, 0], "variance": [20, 20, 0] },
//!                      "brightness": { "min": 74, "max": 255 },
//!                      "flash": { "probability": 0.05, "color": [255, 255, 255], "duration": 1.0 } },
//!     "overhead":    { "type": "scene", "scenes": { "ids": [5, 28, 31], "speed_min": 10, "speed_max": 190 } },
//!     "battlefield": { "type": "inherit_backdrop" }
//!   }
//! }
//! ```

pub mod model;
pub mod preview;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wiz_transport::protocol::limits as wiz_limits;
use wiz_transport::Rgb;

// ── Group names ──────────────────────────────────────────────────────

/// A named set of bulbs animated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupName {
    Backdrop,
    Overhead,
    Battlefield,
}

impl GroupName {
    pub const ALL: [GroupName; 3] = [Self::Backdrop, Self::Overhead, Self::Battlefield];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backdrop => "backdrop",
            Self::Overhead => "overhead",
            Self::Battlefield => "battlefield",
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownGroup(s.to_string()))
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Why a config could not be resolved. Fatal to the one request that
/// carried it; the running animation is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cycletime must be between 0.001 and 86400 seconds, got {0}")]
    InvalidCycletime(f64),

    #[error("unknown group '{0}' (expected backdrop, overhead or battlefield)")]
    UnknownGroup(String),

    #[error("group {group}: unknown type '{kind}'")]
    UnknownType { group: GroupName, kind: String },

    #[error("group {group}: inherits from {target}, which is not configured")]
    MissingInheritTarget { group: GroupName, target: GroupName },

    #[error("group {group}: inheritance cycle through {target}")]
    InheritanceCycle { group: GroupName, target: GroupName },

    #[error("group {group}: inherits from {target}, which itself inherits (only one level is allowed)")]
    ChainedInheritance { group: GroupName, target: GroupName },

    #[error("group {group}: {field} = {value} is out of range ({range})")]
    OutOfRange {
        group: GroupName,
        field: &'static str,
        value: String,
        range: &'static str,
    },

    #[error("group {group}: {field} min {min} exceeds max {max}")]
    InvertedRange {
        group: GroupName,
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("group {group}: scene id list is empty")]
    EmptyScenes { group: GroupName },
}

// ── Wire (JSON) definition types ─────────────────────────────────────

/// Animation config as received over the command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfigDef {
    /// Seconds between ticks of each group.
    pub cycletime: f64,
    /// Legacy field; accepted and ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash_variance: Option<f64>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupDef>,
}

/// One group's definition before inheritance is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDef {
    /// `rgb`, `scene`, `off` or `inherit_<group>`.
    #[serde(rename = "type", default = "default_group_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<RgbDef>,
    #[serde(default, alias = "scene", skip_serializing_if = "Option::is_none")]
    pub scenes: Option<SceneDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<BrightnessDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<FlashDef>,
}

fn default_group_type() -> String {
    "rgb".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbDef {
    pub base: Option<[i64; 3]>,
    pub variance: Option<[i64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDef {
    pub ids: Option<Vec<i64>>,
    pub speed_min: Option<i64>,
    pub speed_max: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrightnessDef {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashDef {
    pub probability: Option<f64>,
    pub color: Option<[i64; 3]>,
    pub brightness: Option<i64>,
    /// Seconds the flash is held.
    pub duration: Option<f64>,
}

// ── Resolved (runtime) types ─────────────────────────────────────────

pub mod defaults {
    use wiz_transport::Rgb;

    pub const RGB_BASE: Rgb = Rgb::new(128, 128, 128);
    pub const RGB_VARIANCE: [u8; 3] = [20, 20, 20];
    pub const SCENE_IDS: [u16; 3] = [5, 28, 31];
    pub const SPEED_MIN: u8 = 10;
    pub const SPEED_MAX: u8 = 190;
    pub const BRIGHTNESS_MIN: u8 = 100;
    pub const BRIGHTNESS_MAX: u8 = 255;
    pub const FLASH_PROBABILITY: f64 = 0.05;
    pub const FLASH_COLOR: Rgb = Rgb::WHITE;
    pub const FLASH_BRIGHTNESS: u8 = 255;
    pub const FLASH_DURATION_SECS: f64 = 1.0;
}

/// Bounds on time values accepted from a config.
pub mod limits {
    use std::time::Duration;

    pub const CYCLETIME_MIN: Duration = Duration::from_millis(1);
    pub const CYCLETIME_MAX: Duration = Duration::from_secs(24 * 60 * 60);
    pub const FLASH_DURATION_MAX: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Fully resolved light show. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub cycletime: Duration,
    pub groups: BTreeMap<GroupName, GroupSpec>,
}

/// What one group does each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub pattern: Pattern,
    pub brightness: BrightnessRange,
    pub flash: Option<FlashSpec>,
}

impl GroupSpec {
    /// Disabled groups are turned off instead of animated.
    pub fn is_off(&self) -> bool {
        matches!(self.pattern, Pattern::Off)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Random color around a base
    Rgb { base: Rgb, variance: [u8; 3] },
    /// Random vendor preset at a random speed
    Scene {
        ids: Vec<u16>,
        speed_min: u8,
        speed_max: u8,
    },
    Off,
}

/// Inclusive brightness bounds, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRange {
    pub min: u8,
    pub max: u8,
}

impl Default for BrightnessRange {
    fn default() -> Self {
        Self {
            min: defaults::BRIGHTNESS_MIN,
            max: defaults::BRIGHTNESS_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashSpec {
    /// Chance per eligible tick, in [0, 1].
    pub probability: f64,
    pub color: Rgb,
    pub brightness: u8,
    pub duration: Duration,
}

// ── Resolution ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Rgb,
    Scene,
    Off,
    Inherit(GroupName),
}

fn parse_kind(group: GroupName, kind: &str) -> Result<GroupKind, ConfigError> {
    match kind {
        "rgb" => Ok(GroupKind::Rgb),
        "scene" => Ok(GroupKind::Scene),
        "off" => Ok(GroupKind::Off),
        other => other
            .strip_prefix("inherit_")
            .and_then(|target| target.parse().ok())
            .map(GroupKind::Inherit)
            .ok_or_else(|| ConfigError::UnknownType {
                group,
                kind: other.to_string(),
            }),
    }
}

/// Resolve and validate a config received over the channel.
pub fn resolve(def: &AnimationConfigDef) -> Result<AnimationConfig, ConfigError> {
    let cycletime = Duration::try_from_secs_f64(def.cycletime)
        .ok()
        .filter(|c| (limits::CYCLETIME_MIN..=limits::CYCLETIME_MAX).contains(c))
        .ok_or(ConfigError::InvalidCycletime(def.cycletime))?;
    if let Some(fv) = def.flash_variance {
        debug!("ignoring legacy flash_variance = {fv}");
    }

    let mut named = BTreeMap::new();
    for (name, group_def) in &def.groups {
        let group: GroupName = name.parse()?;
        let kind = parse_kind(group, &group_def.kind)?;
        named.insert(group, (kind, group_def));
    }

    let mut groups = BTreeMap::new();
    for (&group, &(kind, group_def)) in &named {
        let spec = match kind {
            GroupKind::Inherit(target) => {
                if target == group {
                    return Err(ConfigError::InheritanceCycle { group, target });
                }
                let &(target_kind, target_def) = named
                    .get(&target)
                    .ok_or(ConfigError::MissingInheritTarget { group, target })?;
                match target_kind {
                    GroupKind::Inherit(next) if next == group => {
                        return Err(ConfigError::InheritanceCycle { group, target })
                    }
                    GroupKind::Inherit(_) => {
                        return Err(ConfigError::ChainedInheritance { group, target })
                    }
                    _ => {}
                }
                let mut spec = resolve_concrete(target, target_kind, target_def)?;
                // The inheriting group's own blocks win over the copied ones
                if let Some(b) = &group_def.brightness {
                    spec.brightness = resolve_brightness(group, Some(b))?;
                }
                if group_def.flash.is_some() {
                    spec.flash = resolve_flash(group, group_def.flash.as_ref())?;
                }
                spec
            }
            concrete => resolve_concrete(group, concrete, group_def)?,
        };
        let spec = if group_def.enabled == Some(false) {
            GroupSpec {
                pattern: Pattern::Off,
                ..spec
            }
        } else {
            spec
        };
        groups.insert(group, spec);
    }

    Ok(AnimationConfig {
        cycletime,
        groups,
    })
}

fn resolve_concrete(
    group: GroupName,
    kind: GroupKind,
    def: &GroupDef,
) -> Result<GroupSpec, ConfigError> {
    let pattern = match kind {
        GroupKind::Rgb => {
            let rgb = def.rgb.as_ref();
            let base = match rgb.and_then(|r| r.base) {
                Some(b) => Rgb::from(channels(group, "rgb.base", b)?),
                None => defaults::RGB_BASE,
            };
            let variance = match rgb.and_then(|r| r.variance) {
                Some(v) => channels(group, "rgb.variance", v)?,
                None => defaults::RGB_VARIANCE,
            };
            Pattern::Rgb { base, variance }
        }
        GroupKind::Scene => {
            let scenes = def.scenes.as_ref();
            let ids = match scenes.and_then(|s| s.ids.as_ref()) {
                Some(ids) => ids
                    .iter()
                    .map(|&id| {
                        u16::try_from(id)
                            .ok()
                            .filter(|&id| id > 0)
                            .ok_or_else(|| ConfigError::OutOfRange {
                                group,
                                field: "scenes.ids",
                                value: id.to_string(),
                                range: "1-65535",
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                None => defaults::SCENE_IDS.to_vec(),
            };
            if ids.is_empty() {
                return Err(ConfigError::EmptyScenes { group });
            }
            let speed_min = speed(group, "scenes.speed_min", scenes.and_then(|s| s.speed_min))?
                .unwrap_or(defaults::SPEED_MIN);
            let speed_max = speed(group, "scenes.speed_max", scenes.and_then(|s| s.speed_max))?
                .unwrap_or(defaults::SPEED_MAX);
            if speed_min > speed_max {
                return Err(ConfigError::InvertedRange {
                    group,
                    field: "scenes.speed",
                    min: speed_min.into(),
                    max: speed_max.into(),
                });
            }
            Pattern::Scene {
                ids,
                speed_min,
                speed_max,
            }
        }
        GroupKind::Off => Pattern::Off,
        GroupKind::Inherit(target) => {
            return Err(ConfigError::ChainedInheritance { group, target });
        }
    };

    Ok(GroupSpec {
        pattern,
        brightness: resolve_brightness(group, def.brightness.as_ref())?,
        flash: resolve_flash(group, def.flash.as_ref())?,
    })
}

fn resolve_brightness(
    group: GroupName,
    def: Option<&BrightnessDef>,
) -> Result<BrightnessRange, ConfigError> {
    let min = match def.and_then(|b| b.min) {
        Some(v) => channel(group, "brightness.min", v)?,
        None => defaults::BRIGHTNESS_MIN,
    };
    let max = match def.and_then(|b| b.max) {
        Some(v) => channel(group, "brightness.max", v)?,
        None => defaults::BRIGHTNESS_MAX,
    };
    if min > max {
        return Err(ConfigError::InvertedRange {
            group,
            field: "brightness",
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(BrightnessRange { min, max })
}

fn resolve_flash(group: GroupName, def: Option<&FlashDef>) -> Result<Option<FlashSpec>, ConfigError> {
    let Some(def) = def else {
        return Ok(None);
    };

    let probability = def.probability.unwrap_or(defaults::FLASH_PROBABILITY);
    if !(0.0..=1.0).contains(&probability) {
        return Err(ConfigError::OutOfRange {
            group,
            field: "flash.probability",
            value: probability.to_string(),
            range: "0-1",
        });
    }
    let color = match def.color {
        Some(c) => Rgb::from(channels(group, "flash.color", c)?),
        None => defaults::FLASH_COLOR,
    };
    let brightness = match def.brightness {
        Some(b) => channel(group, "flash.brightness", b)?,
        None => defaults::FLASH_BRIGHTNESS,
    };
    let seconds = def.duration.unwrap_or(defaults::FLASH_DURATION_SECS);
    let duration = Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| *d <= limits::FLASH_DURATION_MAX)
        .ok_or_else(|| ConfigError::OutOfRange {
            group,
            field: "flash.duration",
            value: seconds.to_string(),
            range: "0-86400 seconds",
        })?;

    Ok(Some(FlashSpec {
        probability,
        color,
        brightness,
        duration,
    }))
}

fn channel(group: GroupName, field: &'static str, value: i64) -> Result<u8, ConfigError> {
    u8::try_from(value).map_err(|_| ConfigError::OutOfRange {
        group,
        field,
        value: value.to_string(),
        range: "0-255",
    })
}

fn channels(group: GroupName, field: &'static str, values: [i64; 3]) -> Result<[u8; 3], ConfigError> {
    Ok([
        channel(group, field, values[0])?,
        channel(group, field, values[1])?,
        channel(group, field, values[2])?,
    ])
}

fn speed(group: GroupName, field: &'static str, value: Option<i64>) -> Result<Option<u8>, ConfigError> {
    let Some(v) = value else {
        return Ok(None);
    };
    u8::try_from(v)
        .ok()
        .filter(|s| (wiz_limits::SPEED_MIN..=wiz_limits::SPEED_MAX).contains(s))
        .map(Some)
        .ok_or_else(|| ConfigError::OutOfRange {
            group,
            field,
            value: v.to_string(),
            range: "10-200",
        })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> AnimationConfigDef {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_rgb_with_defaults() {
        let cfg = resolve(&parse(json!({
            "cycletime": 12,
            "groups": { "backdrop": { "type": "rgb" } }
        })))
        .unwrap();
        assert_eq!(cfg.cycletime, Duration::from_secs(12));
        let spec = &cfg.groups[&GroupName::Backdrop];
        assert_eq!(
            spec.pattern,
            Pattern::Rgb {
                base: Rgb::new(128, 128, 128),
                variance: [20, 20, 20]
            }
        );
        assert_eq!(spec.brightness, BrightnessRange { min: 100, max: 255 });
        assert!(spec.flash.is_none());
    }

    #[test]
    fn test_flash_block_defaults_probability() {
        let cfg = resolve(&parse(json!({
            "cycletime": 2,
            "groups": { "overhead": { "type": "rgb", "flash": { "color": [255, 0, 0] } } }
        })))
        .unwrap();
        let flash = cfg.groups[&GroupName::Overhead].flash.unwrap();
        assert_eq!(flash.probability, 0.05);
        assert_eq!(flash.color, Rgb::new(255, 0, 0));
        assert_eq!(flash.brightness, 255);
        assert_eq!(flash.duration, Duration::from_secs(1));
    }

    #[test]
    fn test_scene_block_alias() {
        let cfg = resolve(&parse(json!({
            "cycletime": 5,
            "groups": { "overhead": { "type": "scene", "scene": { "ids": [4], "speed_min": 50, "speed_max": 60 } } }
        })))
        .unwrap();
        assert_eq!(
            cfg.groups[&GroupName::Overhead].pattern,
            Pattern::Scene {
                ids: vec![4],
                speed_min: 50,
                speed_max: 60
            }
        );
    }

    #[test]
    fn test_inheritance_copies_target() {
        let cfg = resolve(&parse(json!({
            "cycletime": 12,
            "groups": {
                "backdrop": { "type": "rgb", "rgb": { "base": [10, 20, 30], "variance": [0, 0, 0] } },
                "battlefield": { "type": "inherit_backdrop" }
            }
        })))
        .unwrap();
        assert_eq!(
            cfg.groups[&GroupName::Battlefield],
            cfg.groups[&GroupName::Backdrop]
        );
    }

    #[test]
    fn test_inheritance_own_brightness_overrides() {
        let cfg = resolve(&parse(json!({
            "cycletime": 12,
            "groups": {
                "backdrop": { "type": "rgb", "brightness": { "min": 10, "max": 20 } },
                "overhead": { "type": "inherit_backdrop", "brightness": { "min": 200, "max": 210 } }
            }
        })))
        .unwrap();
        assert_eq!(
            cfg.groups[&GroupName::Overhead].brightness,
            BrightnessRange { min: 200, max: 210 }
        );
        assert_eq!(
            cfg.groups[&GroupName::Backdrop].brightness,
            BrightnessRange { min: 10, max: 20 }
        );
    }

    #[test]
    fn test_inheritance_errors() {
        let missing = parse(json!({
            "cycletime": 1,
            "groups": { "overhead": { "type": "inherit_backdrop" } }
        }));
        assert_eq!(
            resolve(&missing),
            Err(ConfigError::MissingInheritTarget {
                group: GroupName::Overhead,
                target: GroupName::Backdrop
            })
        );

        let self_ref = parse(json!({
            "cycletime": 1,
            "groups": { "backdrop": { "type": "inherit_backdrop" } }
        }));
        assert!(matches!(
            resolve(&self_ref),
            Err(ConfigError::InheritanceCycle { .. })
        ));

        let cycle = parse(json!({
            "cycletime": 1,
            "groups": {
                "backdrop": { "type": "inherit_overhead" },
                "overhead": { "type": "inherit_backdrop" }
            }
        }));
        assert!(matches!(
            resolve(&cycle),
            Err(ConfigError::InheritanceCycle { .. })
        ));

        let chain = parse(json!({
            "cycletime": 1,
            "groups": {
                "backdrop": { "type": "rgb" },
                "overhead": { "type": "inherit_backdrop" },
                "battlefield": { "type": "inherit_overhead" }
            }
        }));
        assert_eq!(
            resolve(&chain),
            Err(ConfigError::ChainedInheritance {
                group: GroupName::Battlefield,
                target: GroupName::Overhead
            })
        );
    }

    #[test]
    fn test_disabled_group_resolves_off() {
        let cfg = resolve(&parse(json!({
            "cycletime": 3,
            "groups": {
                "backdrop": { "type": "rgb", "enabled": false },
                "overhead": { "type": "off" }
            }
        })))
        .unwrap();
        assert!(cfg.groups[&GroupName::Backdrop].is_off());
        assert!(cfg.groups[&GroupName::Overhead].is_off());
    }

    #[test]
    fn test_numeric_validation() {
        let bad_cycle = parse(json!({ "cycletime": 0, "groups": {} }));
        assert_eq!(resolve(&bad_cycle), Err(ConfigError::InvalidCycletime(0.0)));

        let bad_channel = parse(json!({
            "cycletime": 1,
            "groups": { "backdrop": { "type": "rgb", "rgb": { "base": [300, 0, 0], "variance": [0, 0, 0] } } }
        }));
        assert!(matches!(
            resolve(&bad_channel),
            Err(ConfigError::OutOfRange { field: "rgb.base", .. })
        ));

        let inverted = parse(json!({
            "cycletime": 1,
            "groups": { "backdrop": { "type": "rgb", "brightness": { "min": 200, "max": 100 } } }
        }));
        assert!(matches!(
            resolve(&inverted),
            Err(ConfigError::InvertedRange { field: "brightness", .. })
        ));

        let bad_prob = parse(json!({
            "cycletime": 1,
            "groups": { "backdrop": { "type": "rgb", "flash": { "probability": 1.5 } } }
        }));
        assert!(matches!(
            resolve(&bad_prob),
            Err(ConfigError::OutOfRange { field: "flash.probability", .. })
        ));

        let empty_scenes = parse(json!({
            "cycletime": 1,
            "groups": { "overhead": { "type": "scene", "scenes": { "ids": [] } } }
        }));
        assert_eq!(
            resolve(&empty_scenes),
            Err(ConfigError::EmptyScenes {
                group: GroupName::Overhead
            })
        );

        let slow = parse(json!({
            "cycletime": 1,
            "groups": { "overhead": { "type": "scene", "scenes": { "ids": [1], "speed_min": 5 } } }
        }));
        assert!(matches!(
            resolve(&slow),
            Err(ConfigError::OutOfRange { field: "scenes.speed_min", .. })
        ));
    }

    #[test]
    fn test_cycletime_bounds() {
        let cycletime = |c: f64| resolve(&parse(json!({ "cycletime": c, "groups": {} }))).map(|cfg| cfg.cycletime);

        assert_eq!(cycletime(0.001), Ok(Duration::from_millis(1)));
        assert_eq!(cycletime(86400.0), Ok(Duration::from_secs(86400)));
        for bad in [1e-10, 0.0005, -4.0, 86401.0, 1e20, f64::MAX] {
            assert_eq!(cycletime(bad), Err(ConfigError::InvalidCycletime(bad)));
        }
    }

    #[test]
    fn test_flash_duration_bounds() {
        let duration = |d: f64| {
            resolve(&parse(json!({
                "cycletime": 1,
                "groups": { "backdrop": { "type": "rgb", "flash": { "duration": d } } }
            })))
            .map(|cfg| cfg.groups[&GroupName::Backdrop].flash.map(|f| f.duration))
        };

        assert_eq!(duration(0.0), Ok(Some(Duration::ZERO)));
        assert_eq!(duration(86400.0), Ok(Some(Duration::from_secs(86400))));
        for bad in [-1.0, 86400.5, 1e20] {
            assert!(matches!(
                duration(bad),
                Err(ConfigError::OutOfRange { field: "flash.duration", .. })
            ));
        }
    }

    #[test]
    fn test_unknown_names() {
        let unknown_group = parse(json!({ "cycletime": 1, "groups": { "kitchen": { "type": "rgb" } } }));
        assert_eq!(
            resolve(&unknown_group),
            Err(ConfigError::UnknownGroup("kitchen".into()))
        );

        let unknown_type = parse(json!({ "cycletime": 1, "groups": { "backdrop": { "type": "strobe" } } }));
        assert!(matches!(
            resolve(&unknown_type),
            Err(ConfigError::UnknownType { .. })
        ));

        let unknown_target = parse(json!({ "cycletime": 1, "groups": { "backdrop": { "type": "inherit_kitchen" } } }));
        assert!(matches!(
            resolve(&unknown_target),
            Err(ConfigError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_legacy_flash_variance_accepted() {
        let cfg = parse(json!({ "cycletime": 12, "flash_variance": 25, "groups": {} }));
        assert!(resolve(&cfg).is_ok());
    }
}
