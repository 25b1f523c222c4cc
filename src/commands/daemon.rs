//! `daemon`: serve the JSON-lines protocol on stdin/stdout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ambience_lights::daemon::{serve, DaemonController};
use ambience_lights::LightsConfig;
use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::Notify;
use tracing::{info, warn};
use wiz_transport::{BoxedTransport, DryRunTransport, WizUdpTransport};

use super::CommandResult;
use crate::cli::DaemonArgs;

pub async fn run(config_path: &Path, args: &DaemonArgs) -> CommandResult {
    let lights = if args.dry_run {
        LightsConfig::load_or_default(config_path)?
    } else {
        LightsConfig::load(config_path)?
    };
    let mut inventory = lights.inventory()?;
    for bulb in &args.bulbs {
        inventory.add_override(bulb, lights.transport.port)?;
    }
    if inventory.is_empty() {
        warn!("no bulbs configured; animations will not drive any lights");
    }

    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| lights.transport.timeout());
    let transport: BoxedTransport = if args.dry_run {
        Arc::new(DryRunTransport)
    } else {
        Arc::new(WizUdpTransport::new(timeout))
    };
    info!(
        "{} bulbs in {:?} via {} (timeout {}ms)",
        inventory.bulb_count(),
        inventory.groups(),
        transport.name(),
        timeout.as_millis()
    );

    // Ctrl-C / SIGTERM
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || signal.notify_one()).context("install signal handler")?;

    let (controller, events) = DaemonController::new(inventory, transport);
    serve(
        controller,
        events,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        async move { shutdown.notified().await },
    )
    .await?;

    // The blocking stdin reader cannot be cancelled, so don't wait on it
    std::process::exit(0)
}
