//! `check`: validate an animation config and show what each group resolves to.

use std::path::Path;

use ambience_lights::animation::Pattern;

use super::CommandResult;

pub fn run(file: &Path) -> CommandResult {
    let config = super::load_animation(file)?;

    println!("{}: OK", file.display());
    println!("Cycletime: {:.2}s", config.cycletime.as_secs_f64());
    println!();
    println!("{:<12} {:<40} {:<10} Flash", "Group", "Pattern", "Brightness");
    println!("{}", "-".repeat(76));

    for (group, spec) in &config.groups {
        let pattern = match &spec.pattern {
            Pattern::Rgb { base, variance } => format!(
                "rgb [{},{},{}] +/- [{},{},{}]",
                base.r, base.g, base.b, variance[0], variance[1], variance[2]
            ),
            Pattern::Scene {
                ids,
                speed_min,
                speed_max,
            } => format!("scene {ids:?} speed {speed_min}-{speed_max}"),
            Pattern::Off => "off".to_string(),
        };
        let brightness = format!("{}-{}", spec.brightness.min, spec.brightness.max);
        let flash = match &spec.flash {
            Some(f) => format!(
                "{:.0}% [{},{},{}] @ {} for {:.1}s",
                f.probability * 100.0,
                f.color.r,
                f.color.g,
                f.color.b,
                f.brightness,
                f.duration.as_secs_f64()
            ),
            None => "-".to_string(),
        };
        println!("{:<12} {:<40} {:<10} {}", group.as_str(), pattern, brightness, flash);
    }

    Ok(())
}
