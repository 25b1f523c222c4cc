//! `bulbs`: show the inventory the daemon would drive.

use std::path::Path;

use ambience_lights::{GroupName, LightsConfig};

use super::CommandResult;

pub fn run(config_path: &Path) -> CommandResult {
    let lights = LightsConfig::load(config_path)?;
    let inventory = lights.inventory()?;

    println!("Bulbs (from {}):", config_path.display());
    println!();
    for group in GroupName::ALL {
        let addresses = inventory.addresses(group);
        if addresses.is_empty() {
            println!("  {:<12} (none)", group.as_str());
            continue;
        }
        for (i, address) in addresses.iter().enumerate() {
            let label = if i == 0 { group.as_str() } else { "" };
            println!("  {label:<12} {address}");
        }
    }
    println!();
    println!(
        "{} bulbs, timeout {}ms, default port {}",
        inventory.bulb_count(),
        lights.transport.timeout_ms,
        lights.transport.port
    );

    Ok(())
}
