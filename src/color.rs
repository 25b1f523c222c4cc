// Color conversion utilities for on-screen swatches

use wiz_transport::{LightState, Rgb};

/// Convert HSV to RGB
/// h: hue (0-360)
/// s: saturation (0-1)
/// v: value/brightness (0-1)
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgb::new(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Scale a color by a 0-255 brightness.
pub fn scale(c: Rgb, brightness: u8) -> Rgb {
    let f = brightness as f32 / 255.0;
    Rgb::new(
        (c.r as f32 * f) as u8,
        (c.g as f32 * f) as u8,
        (c.b as f32 * f) as u8,
    )
}

/// Rough color of a black-body white point, good enough for a swatch.
pub fn kelvin_to_rgb(kelvin: u16) -> Rgb {
    let t = (kelvin.clamp(1000, 10000) as f32 - 1000.0) / 9000.0;
    // Warm (255, 140, 40) through neutral to cool (200, 220, 255)
    let lerp = |a: f32, b: f32| (a + (b - a) * t) as u8;
    Rgb::new(lerp(255.0, 200.0), lerp(140.0, 220.0), lerp(40.0, 255.0))
}

/// Approximate what a bulb in `state` looks like.
///
/// Scenes are vendor animations with no fixed color, so each id gets a
/// stable hue of its own.
pub fn swatch(state: &LightState) -> Rgb {
    match *state {
        LightState::Color { rgb, brightness } => scale(rgb, brightness),
        LightState::Scene { id, brightness, .. } => {
            scale(hsv_to_rgb((id as f32 * 47.0) % 360.0, 0.8, 1.0), brightness)
        }
        LightState::White { kelvin, brightness } => scale(kelvin_to_rgb(kelvin), brightness),
        LightState::Off => Rgb::BLACK,
    }
}
