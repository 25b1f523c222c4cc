// Ambience lighting daemon - shared library
// Animation model, bulb inventory, and the per-group daemon runtime

pub mod animation;
pub mod color;
pub mod daemon;
pub mod inventory;

pub use animation::{resolve, AnimationConfig, AnimationConfigDef, ConfigError, GroupName, GroupSpec};
pub use daemon::{DaemonController, DaemonMessage, DaemonRequest};
pub use inventory::{BulbInventory, InventoryError, LightsConfig};
