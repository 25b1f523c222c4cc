//! Common types for the transport layer

use serde::{Deserialize, Serialize};

/// RGB color, serialized as a `[r, g, b]` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in r, g, b order.
    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        c.channels()
    }
}

/// Desired state for one bulb.
///
/// Brightness is the 0-255 scale used by animation configs; the WiZ
/// encoder maps it to the bulb's dimming percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    /// Raw color target
    Color { rgb: Rgb, brightness: u8 },
    /// Vendor preset animation
    Scene { id: u16, speed: u8, brightness: u8 },
    /// Tunable white
    White { kelvin: u16, brightness: u8 },
    /// Power off
    Off,
}

impl LightState {
    /// Short human-readable description for logs and CLI output.
    pub fn describe(&self) -> String {
        match *self {
            Self::Color { rgb, brightness } => format!(
                "rgb({}, {}, {}) @ {}",
                rgb.r, rgb.g, rgb.b, brightness
            ),
            Self::Scene {
                id,
                speed,
                brightness,
            } => format!("scene {id} speed {speed} @ {brightness}"),
            Self::White { kelvin, brightness } => format!("{kelvin}K @ {brightness}"),
            Self::Off => "off".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_serializes_as_array() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Rgb = serde_json::from_str("[255,0,128]").unwrap();
        assert_eq!(back, Rgb::new(255, 0, 128));
    }

    #[test]
    fn test_rgb_rejects_out_of_range_channel() {
        assert!(serde_json::from_str::<Rgb>("[256,0,0]").is_err());
    }
}
