//! The animation model: turns a group spec into a concrete light state.
//!
//! Pure apart from the random generator handed in by the caller, so tests
//! can drive it with a seeded RNG.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use wiz_transport::{LightState, Rgb};

use super::{BrightnessRange, FlashSpec, GroupSpec, Pattern};

/// A spec that slipped past resolution in a shape the model cannot draw
/// from. Resolution rejects all of these, so seeing one is a bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("scene id list is empty")]
    EmptyScenes,
    #[error("inverted {field} range {min}..{max}")]
    InvertedRange {
        field: &'static str,
        min: u8,
        max: u8,
    },
}

/// Draw the base (non-flash) state for a group.
pub fn draw_base<R: Rng + ?Sized>(spec: &GroupSpec, rng: &mut R) -> Result<LightState, ModelError> {
    match &spec.pattern {
        Pattern::Rgb { base, variance } => Ok(LightState::Color {
            rgb: draw_color(*base, *variance, rng),
            brightness: draw_brightness(spec.brightness, rng)?,
        }),
        Pattern::Scene {
            ids,
            speed_min,
            speed_max,
        } => {
            let id = *ids.choose(rng).ok_or(ModelError::EmptyScenes)?;
            if speed_min > speed_max {
                return Err(ModelError::InvertedRange {
                    field: "speed",
                    min: *speed_min,
                    max: *speed_max,
                });
            }
            Ok(LightState::Scene {
                id,
                speed: rng.gen_range(*speed_min..=*speed_max),
                brightness: draw_brightness(spec.brightness, rng)?,
            })
        }
        Pattern::Off => Ok(LightState::Off),
    }
}

/// `base[c] + uniform(-variance[c], +variance[c])` per channel, clamped.
pub fn draw_color<R: Rng + ?Sized>(base: Rgb, variance: [u8; 3], rng: &mut R) -> Rgb {
    let mut out = base.channels();
    for (value, spread) in out.iter_mut().zip(variance) {
        let spread = spread as i16;
        let offset = rng.gen_range(-spread..=spread);
        *value = (*value as i16 + offset).clamp(0, 255) as u8;
    }
    Rgb::from(out)
}

/// Uniform brightness in `[min, max]`.
pub fn draw_brightness<R: Rng + ?Sized>(range: BrightnessRange, rng: &mut R) -> Result<u8, ModelError> {
    if range.min > range.max {
        return Err(ModelError::InvertedRange {
            field: "brightness",
            min: range.min,
            max: range.max,
        });
    }
    Ok(rng.gen_range(range.min..=range.max))
}

/// Whether this tick starts a flash.
pub fn roll_flash<R: Rng + ?Sized>(flash: Option<&FlashSpec>, rng: &mut R) -> bool {
    match flash {
        Some(f) if f.probability > 0.0 => rng.gen::<f64>() < f.probability,
        _ => false,
    }
}

/// The state shown while a flash is held.
pub fn flash_state(flash: &FlashSpec) -> LightState {
    LightState::Color {
        rgb: flash.color,
        brightness: flash.brightness,
    }
}
