//! `set`: one awaited dispatch to every bulb in a group.

use std::path::Path;
use std::time::Duration;

use ambience_lights::daemon::protocol::{WARM_WHITE_BRIGHTNESS, WARM_WHITE_KELVIN};
use ambience_lights::LightsConfig;
use futures::future::join_all;
use wiz_transport::{BulbTransport, LightState, Rgb, WizUdpTransport};

use super::CommandResult;
use crate::cli::SetArgs;

pub async fn run(config_path: &Path, args: &SetArgs) -> CommandResult {
    let lights = LightsConfig::load(config_path)?;
    let inventory = lights.inventory()?;
    let addresses = inventory.addresses(args.group);
    if addresses.is_empty() {
        eprintln!("No bulbs configured for {}", args.group);
        return Ok(());
    }

    let state = target_state(args);
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| lights.transport.timeout());
    let transport = &WizUdpTransport::new(timeout);

    println!("{} -> {}", args.group, state.describe());
    let results = join_all(
        addresses
            .iter()
            .map(|&address| async move { (address, transport.set_state(address, &state).await) }),
    )
    .await;

    let mut failed = 0;
    for (address, result) in results {
        match result {
            Ok(()) => println!("  {address:<22} ok"),
            Err(e) => {
                failed += 1;
                println!("  {address:<22} {e}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} bulbs did not respond", addresses.len());
    }
    Ok(())
}

fn target_state(args: &SetArgs) -> LightState {
    if args.off {
        LightState::Off
    } else if args.warm_white {
        LightState::White {
            kelvin: WARM_WHITE_KELVIN,
            brightness: WARM_WHITE_BRIGHTNESS,
        }
    } else if let Some(id) = args.scene {
        LightState::Scene {
            id,
            speed: args.speed,
            brightness: args.brightness,
        }
    } else {
        LightState::Color {
            rgb: Rgb::from(args.rgb.unwrap_or([255, 255, 255])),
            brightness: args.brightness,
        }
    }
}
