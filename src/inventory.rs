//! Bulb inventory and transport settings.
//!
//! Loaded from `~/.config/ambience/lights.toml`:
//!
//! ```toml
//! [bulbs]
//! backdrop = ["192.168.1.165", "192.168.1.159"]
//! overhead = ["192.168.1.161:38899"]
//!
//! [transport]
//! timeout_ms = 1000
//! port = 38899
//! ```

use std::collections::BTreeMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wiz_transport::protocol::{timing, DEFAULT_PORT};

use crate::animation::GroupName;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown bulb group '{0}' (expected backdrop, overhead or battlefield)")]
    UnknownGroup(String),

    #[error("bad bulb address '{0}' (expected IP or IP:PORT)")]
    BadAddress(String),

    #[error("{address} is listed under both {first} and {second}")]
    DuplicateAddress {
        address: SocketAddr,
        first: GroupName,
        second: GroupName,
    },

    #[error("bulb override must look like GROUP=ADDRESS, got '{0}'")]
    BadOverride(String),
}

/// Contents of `lights.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightsConfig {
    /// Group name to bulb addresses
    #[serde(default)]
    pub bulbs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Upper bound on one dispatch
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Port used when an address has none
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_timeout_ms() -> u64 {
    timing::DEFAULT_TIMEOUT_MS
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            port: default_port(),
        }
    }
}

impl TransportSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LightsConfig {
    /// Get the default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ambience")
            .join("lights.toml")
    }

    /// Load from `path`. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Load from `path`, or an empty inventory if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, InventoryError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(InventoryError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse(path: &Path, content: &str) -> Result<Self, InventoryError> {
        toml::from_str(content).map_err(|source| InventoryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve names and addresses into a checked inventory.
    pub fn inventory(&self) -> Result<BulbInventory, InventoryError> {
        let mut inventory = BulbInventory::default();
        for (name, addresses) in &self.bulbs {
            let group: GroupName = name
                .parse()
                .map_err(|_| InventoryError::UnknownGroup(name.clone()))?;
            inventory.declare(group);
            for address in addresses {
                inventory.add(group, parse_address(address, self.transport.port)?)?;
            }
        }
        Ok(inventory)
    }
}

/// Parse `IP` or `IP:PORT`.
pub fn parse_address(s: &str, default_port: u16) -> Result<SocketAddr, InventoryError> {
    let s = s.trim();
    s.parse::<SocketAddr>()
        .or_else(|_| s.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, default_port)))
        .map_err(|_| InventoryError::BadAddress(s.to_string()))
}

/// Bulbs per group. An address belongs to at most one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulbInventory {
    groups: BTreeMap<GroupName, Vec<SocketAddr>>,
}

impl BulbInventory {
    fn declare(&mut self, group: GroupName) {
        self.groups.entry(group).or_default();
    }

    pub fn add(&mut self, group: GroupName, address: SocketAddr) -> Result<(), InventoryError> {
        if let Some(first) = self.group_of(address) {
            return Err(InventoryError::DuplicateAddress {
                address,
                first,
                second: group,
            });
        }
        self.groups.entry(group).or_default().push(address);
        Ok(())
    }

    /// Apply a `GROUP=ADDRESS` override from the command line.
    pub fn add_override(&mut self, spec: &str, default_port: u16) -> Result<(), InventoryError> {
        let (group, address) = spec
            .split_once('=')
            .ok_or_else(|| InventoryError::BadOverride(spec.to_string()))?;
        let group: GroupName = group
            .trim()
            .parse()
            .map_err(|_| InventoryError::UnknownGroup(group.trim().to_string()))?;
        self.add(group, parse_address(address, default_port)?)
    }

    pub fn addresses(&self, group: GroupName) -> &[SocketAddr] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups with at least one bulb.
    pub fn groups(&self) -> Vec<GroupName> {
        self.groups
            .iter()
            .filter(|(_, addrs)| !addrs.is_empty())
            .map(|(&g, _)| g)
            .collect()
    }

    pub fn group_of(&self, address: SocketAddr) -> Option<GroupName> {
        self.groups
            .iter()
            .find(|(_, addrs)| addrs.contains(&address))
            .map(|(&g, _)| g)
    }

    pub fn bulb_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bulb_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[bulbs]
backdrop = ["192.168.1.165", "192.168.1.159"]
overhead = ["192.168.1.161:40000"]
battlefield = []

[transport]
timeout_ms = 250
"#;

    #[test]
    fn test_parse_sample() {
        let config: LightsConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.transport.timeout(), Duration::from_millis(250));
        assert_eq!(config.transport.port, 38899);

        let inv = config.inventory().unwrap();
        assert_eq!(inv.groups(), vec![GroupName::Backdrop, GroupName::Overhead]);
        assert_eq!(
            inv.addresses(GroupName::Backdrop),
            &[
                "192.168.1.165:38899".parse::<SocketAddr>().unwrap(),
                "192.168.1.159:38899".parse::<SocketAddr>().unwrap()
            ]
        );
        assert_eq!(
            inv.addresses(GroupName::Overhead),
            &["192.168.1.161:40000".parse::<SocketAddr>().unwrap()]
        );
        assert!(inv.addresses(GroupName::Battlefield).is_empty());
        assert_eq!(inv.bulb_count(), 3);
    }

    #[test]
    fn test_rejects_unknown_group_and_bad_address() {
        let config: LightsConfig = toml::from_str("[bulbs]\nkitchen = [\"10.0.0.1\"]").unwrap();
        assert!(matches!(
            config.inventory(),
            Err(InventoryError::UnknownGroup(g)) if g == "kitchen"
        ));

        let config: LightsConfig = toml::from_str("[bulbs]\nbackdrop = [\"bulb.local\"]").unwrap();
        assert!(matches!(
            config.inventory(),
            Err(InventoryError::BadAddress(_))
        ));
    }

    #[test]
    fn test_address_in_two_groups_rejected() {
        let config: LightsConfig = toml::from_str(
            "[bulbs]\nbackdrop = [\"10.0.0.1\"]\noverhead = [\"10.0.0.1:38899\"]",
        )
        .unwrap();
        assert!(matches!(
            config.inventory(),
            Err(InventoryError::DuplicateAddress {
                first: GroupName::Backdrop,
                second: GroupName::Overhead,
                ..
            })
        ));
    }

    #[test]
    fn test_overrides() {
        let mut inv = BulbInventory::default();
        inv.add_override("battlefield=10.0.0.9", 38899).unwrap();
        assert_eq!(inv.group_of("10.0.0.9:38899".parse().unwrap()), Some(GroupName::Battlefield));
        assert!(matches!(
            inv.add_override("10.0.0.9", 38899),
            Err(InventoryError::BadOverride(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = LightsConfig::load(file.path()).unwrap();
        assert_eq!(config.bulbs.len(), 3);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            LightsConfig::load(&missing),
            Err(InventoryError::Read { .. })
        ));
        assert_eq!(
            LightsConfig::load_or_default(&missing).unwrap(),
            LightsConfig::default()
        );
    }
}
