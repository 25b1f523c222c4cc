//! WiZ local UDP protocol: message encoding and acknowledgement parsing

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::types::LightState;

/// UDP port WiZ bulbs listen on
pub const DEFAULT_PORT: u16 = 38899;

/// Method names
pub mod method {
    pub const SET_PILOT: &str = "setPilot";
}

/// Value ranges accepted by the firmware
pub mod limits {
    /// Lowest dimming percentage the bulb accepts
    pub const DIMMING_MIN: u8 = 10;
    pub const DIMMING_MAX: u8 = 100;
    /// Scene animation speed range
    pub const SPEED_MIN: u8 = 10;
    pub const SPEED_MAX: u8 = 200;
    /// Tunable white range in Kelvin
    pub const KELVIN_MIN: u16 = 1000;
    pub const KELVIN_MAX: u16 = 10000;
}

/// Timing defaults
pub mod timing {
    /// Upper bound for one dispatch (send + acknowledgement)
    pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
    /// Receive buffer for acknowledgements
    pub const RECV_BUFFER: usize = 1024;
}

/// Map 0-255 brightness onto the bulb's 10-100 dimming percentage.
pub fn brightness_to_dimming(brightness: u8) -> u8 {
    let percent = (brightness as f64 / 255.0 * 100.0).round() as u8;
    percent.clamp(limits::DIMMING_MIN, limits::DIMMING_MAX)
}

/// Build the `setPilot` request for a state.
pub fn set_pilot_request(state: &LightState) -> Value {
    let params = match *state {
        LightState::Color { rgb, brightness } => json!({
            "state": true,
            "r": rgb.r,
            "g": rgb.g,
            "b": rgb.b,
            "dimming": brightness_to_dimming(brightness),
        }),
        LightState::Scene {
            id,
            speed,
            brightness,
        } => json!({
            "state": true,
            "sceneId": id,
            "speed": speed.clamp(limits::SPEED_MIN, limits::SPEED_MAX),
            "dimming": brightness_to_dimming(brightness),
        }),
        LightState::White { kelvin, brightness } => json!({
            "state": true,
            "temp": kelvin.clamp(limits::KELVIN_MIN, limits::KELVIN_MAX),
            "dimming": brightness_to_dimming(brightness),
        }),
        LightState::Off => json!({ "state": false }),
    };
    json!({ "method": method::SET_PILOT, "params": params })
}

/// Encode a `setPilot` request to bytes ready for the socket.
pub fn encode_set_pilot(state: &LightState) -> Result<Vec<u8>, TransportError> {
    Ok(serde_json::to_vec(&set_pilot_request(state))?)
}

#[derive(Debug, Deserialize)]
struct Reply {
    method: Option<String>,
    result: Option<ReplyResult>,
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyResult {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: Option<i64>,
    message: Option<String>,
}

/// Check a bulb's answer to a `setPilot` request.
pub fn parse_set_pilot_ack(data: &[u8]) -> Result<(), TransportError> {
    let reply: Reply = serde_json::from_slice(data)
        .map_err(|e| TransportError::BadResponse(format!("not JSON: {e}")))?;

    if let Some(err) = reply.error {
        return Err(TransportError::Rejected(format!(
            "code {}: {}",
            err.code.unwrap_or_default(),
            err.message.unwrap_or_else(|| "no message".to_string())
        )));
    }

    match reply.method.as_deref() {
        Some(method::SET_PILOT) => {}
        Some(other) => {
            return Err(TransportError::BadResponse(format!(
                "expected {} reply, got {other}",
                method::SET_PILOT
            )))
        }
        None => return Err(TransportError::BadResponse("missing method".into())),
    }

    match reply.result {
        Some(ReplyResult { success: true }) => Ok(()),
        Some(_) => Err(TransportError::Rejected("success=false".into())),
        None => Err(TransportError::BadResponse("missing result".into())),
    }
}
