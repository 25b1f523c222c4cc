//! JSON-lines messages exchanged with the supervising process.
//!
//! Requests carry a `command` tag, replies a `type` tag:
//!
//! ```text
//! -> {"command":"update_animation","config":{"cycletime":12,"groups":{...}}}
//! <- {"type":"status","message":"Animation configuration updated (hot-swapped)","groups":["backdrop"]}
//! -> {"command":"ping"}
//! <- {"type":"pong","animation_running":true,"groups":["backdrop"]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use wiz_transport::{LightState, Rgb};

use crate::animation::{AnimationConfigDef, GroupName};

/// Color temperature of the `warm_white` resting preset.
pub const WARM_WHITE_KELVIN: u16 = 2700;
/// Brightness of the `warm_white` resting preset.
pub const WARM_WHITE_BRIGHTNESS: u8 = 180;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON command: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Command must be a JSON object, got: {0}")]
    NotAnObject(&'static str),

    #[error("Missing 'command' field")]
    MissingCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} command requires 'config' field")]
    MissingConfig(&'static str),

    #[error("Malformed {command} command: {source}")]
    Malformed {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One inbound command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DaemonRequest {
    StartAnimation {
        config: AnimationConfigDef,
    },
    UpdateAnimation {
        config: AnimationConfigDef,
    },
    Stop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resting: Option<RestingState>,
    },
    Ping,
}

impl DaemonRequest {
    /// Parse one input line.
    ///
    /// Checks the envelope by hand first so the error names what is wrong
    /// (unknown command, missing config) instead of a serde message.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line).map_err(ProtocolError::InvalidJson)?;
        let object = match &value {
            Value::Object(map) => map,
            Value::Array(_) => return Err(ProtocolError::NotAnObject("array")),
            Value::String(_) => return Err(ProtocolError::NotAnObject("string")),
            Value::Number(_) => return Err(ProtocolError::NotAnObject("number")),
            Value::Bool(_) => return Err(ProtocolError::NotAnObject("bool")),
            Value::Null => return Err(ProtocolError::NotAnObject("null")),
        };

        let command = match object.get("command") {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(ProtocolError::UnknownCommand(other.to_string())),
            None => return Err(ProtocolError::MissingCommand),
        };
        let command: &'static str = match command {
            "start_animation" => "start_animation",
            "update_animation" => "update_animation",
            "stop" => "stop",
            "ping" => "ping",
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };
        if matches!(command, "start_animation" | "update_animation")
            && object.get("config").map_or(true, Value::is_null)
        {
            return Err(ProtocolError::MissingConfig(command));
        }

        serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { command, source })
    }
}

/// Named resting preset for `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestingPreset {
    Off,
    WarmWhite,
}

/// What bulbs are left showing after `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RestingState {
    Preset(RestingPreset),
    Color {
        color: Rgb,
        #[serde(default = "default_resting_brightness")]
        brightness: u8,
    },
}

fn default_resting_brightness() -> u8 {
    255
}

impl RestingState {
    pub fn light_state(self) -> LightState {
        match self {
            Self::Preset(RestingPreset::Off) => LightState::Off,
            Self::Preset(RestingPreset::WarmWhite) => LightState::White {
                kelvin: WARM_WHITE_KELVIN,
                brightness: WARM_WHITE_BRIGHTNESS,
            },
            Self::Color { color, brightness } => LightState::Color {
                rgb: color,
                brightness,
            },
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonMessage {
    Status {
        message: String,
        /// Groups with bulbs in the inventory (startup only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bulb_groups: Option<Vec<GroupName>>,
        /// Groups animating after the command
        #[serde(default, skip_serializing_if = "Option::is_none")]
        groups: Option<Vec<GroupName>>,
    },
    Error {
        message: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<GroupName>,
    },
    Pong {
        animation_running: bool,
        groups: Vec<GroupName>,
    },
}

impl DaemonMessage {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            bulb_groups: None,
            groups: None,
        }
    }

    pub fn status_with_groups(message: impl Into<String>, groups: Vec<GroupName>) -> Self {
        Self::Status {
            message: message.into(),
            bulb_groups: None,
            groups: Some(groups),
        }
    }

    pub fn ready(bulb_groups: Vec<GroupName>) -> Self {
        Self::Status {
            message: "Lighting daemon ready".to_string(),
            bulb_groups: Some(bulb_groups),
            groups: None,
        }
    }

    /// Error with the underlying cause spelled out in `detail`.
    pub fn error_with_detail(message: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: timestamp(),
            detail: Some(detail.to_string()),
            group: None,
        }
    }

    pub fn group_error(group: GroupName, message: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: timestamp(),
            detail: Some(detail.to_string()),
            group: Some(group),
        }
    }

    pub fn pong(animation_running: bool, groups: Vec<GroupName>) -> Self {
        Self::Pong {
            animation_running,
            groups,
        }
    }

    /// Serialize as one newline-terminated line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            DaemonRequest::parse(r#"{"command":"ping"}"#).unwrap(),
            DaemonRequest::Ping
        );
        assert_eq!(
            DaemonRequest::parse(r#"{"command":"stop"}"#).unwrap(),
            DaemonRequest::Stop { resting: None }
        );
        let update = DaemonRequest::parse(
            r#"{"command":"update_animation","config":{"cycletime":2,"groups":{"backdrop":{"type":"rgb"}}}}"#,
        )
        .unwrap();
        match update {
            DaemonRequest::UpdateAnimation { config } => {
                assert_eq!(config.cycletime, 2.0);
                assert!(config.groups.contains_key("backdrop"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            DaemonRequest::parse("{not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            DaemonRequest::parse("[1,2]"),
            Err(ProtocolError::NotAnObject("array"))
        ));
        assert!(matches!(
            DaemonRequest::parse(r#"{"config":{}}"#),
            Err(ProtocolError::MissingCommand)
        ));
        assert!(matches!(
            DaemonRequest::parse(r#"{"command":"dance"}"#),
            Err(ProtocolError::UnknownCommand(c)) if c == "dance"
        ));
        assert!(matches!(
            DaemonRequest::parse(r#"{"command":"start_animation"}"#),
            Err(ProtocolError::MissingConfig("start_animation"))
        ));
        assert!(matches!(
            DaemonRequest::parse(r#"{"command":"update_animation","config":{"groups":{}}}"#),
            Err(ProtocolError::Malformed { command: "update_animation", .. })
        ));
    }

    #[test]
    fn test_resting_states() {
        let parse = |v: Value| match serde_json::from_value::<DaemonRequest>(v).unwrap() {
            DaemonRequest::Stop { resting } => resting.map(RestingState::light_state),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            parse(json!({"command": "stop", "resting": "warm_white"})),
            Some(LightState::White {
                kelvin: 2700,
                brightness: 180
            })
        );
        assert_eq!(
            parse(json!({"command": "stop", "resting": "off"})),
            Some(LightState::Off)
        );
        assert_eq!(
            parse(json!({"command": "stop", "resting": {"color": [10, 20, 30], "brightness": 90}})),
            Some(LightState::Color {
                rgb: Rgb::new(10, 20, 30),
                brightness: 90
            })
        );
    }

    #[test]
    fn test_message_shapes() {
        let pong: Value = serde_json::from_str(
            &DaemonMessage::pong(true, vec![GroupName::Backdrop]).to_line().unwrap(),
        )
        .unwrap();
        assert_eq!(
            pong,
            json!({"type": "pong", "animation_running": true, "groups": ["backdrop"]})
        );

        let status: Value =
            serde_json::to_value(DaemonMessage::status("Animation stopped")).unwrap();
        assert_eq!(status, json!({"type": "status", "message": "Animation stopped"}));

        let err = serde_json::to_value(DaemonMessage::error_with_detail("boom", "cause")).unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["message"], "boom");
        assert_eq!(err["detail"], "cause");
        assert!(chrono::DateTime::parse_from_rfc3339(err["timestamp"].as_str().unwrap()).is_ok());
        assert!(err.get("group").is_none());
    }

    #[test]
    fn test_line_is_newline_terminated() {
        let line = DaemonMessage::status("x").to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }
}
