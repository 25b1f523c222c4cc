//! `preview`: animate a config in the terminal without touching any bulb.

use std::path::Path;

use ambience_lights::animation::preview;

use super::CommandResult;

pub fn run(file: &Path) -> CommandResult {
    let config = super::load_animation(file)?;
    preview::run(&config)
}
