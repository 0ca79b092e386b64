use crate::{ProtocolError, SceneItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KNOWN_EVENTS: &[&str] = &[
    "StreamStateChanged",
    "RecordStateChanged",
    "InputMuteStateChanged",
    "CurrentProgramSceneChanged",
    "SceneListChanged",
    "InputCreated",
    "InputRemoved",
    "InputNameChanged",
    "ExitStarted",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "eventType",
    content = "eventData",
    rename_all_fields = "camelCase"
)]
pub enum Event {
    StreamStateChanged {
        output_active: bool,
        #[serde(default)]
        output_state: String,
    },
    RecordStateChanged {
        output_active: bool,
        #[serde(default)]
        output_state: String,
    },
    InputMuteStateChanged {
        input_name: String,
        input_muted: bool,
    },
    CurrentProgramSceneChanged {
        scene_name: String,
    },
    SceneListChanged {
        #[serde(default)]
        scenes: Vec<SceneItem>,
    },
    InputCreated {
        input_name: String,
        #[serde(default)]
        input_kind: String,
    },
    InputRemoved {
        input_name: String,
    },
    InputNameChanged {
        old_input_name: String,
        input_name: String,
    },
    ExitStarted,
    /// Any event type this client does not consume.
    #[serde(skip)]
    Other(String),
}

impl Event {
    pub fn event_type(&self) -> &str {
        match self {
            Event::StreamStateChanged { .. } => "StreamStateChanged",
            Event::RecordStateChanged { .. } => "RecordStateChanged",
            Event::InputMuteStateChanged { .. } => "InputMuteStateChanged",
            Event::CurrentProgramSceneChanged { .. } => "CurrentProgramSceneChanged",
            Event::SceneListChanged { .. } => "SceneListChanged",
            Event::InputCreated { .. } => "InputCreated",
            Event::InputRemoved { .. } => "InputRemoved",
            Event::InputNameChanged { .. } => "InputNameChanged",
            Event::ExitStarted => "ExitStarted",
            Event::Other(t) => t,
        }
    }

    pub(crate) fn from_wire(mut d: Value) -> Result<Self, ProtocolError> {
        let event_type = d
            .get("eventType")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField("eventType"))?
            .to_string();
        if !KNOWN_EVENTS.contains(&event_type.as_str()) {
            return Ok(Event::Other(event_type));
        }
        if let Some(map) = d.as_object_mut() {
            map.remove("eventIntent");
        }
        Ok(serde_json::from_value(d)?)
    }

    pub(crate) fn to_wire(&self) -> Result<Value, ProtocolError> {
        let mut d = match self {
            Event::Other(t) => serde_json::json!({ "eventType": t }),
            known => serde_json::to_value(known)?,
        };
        if let Some(map) = d.as_object_mut() {
            map.insert("eventIntent".to_string(), Value::from(0));
        }
        Ok(d)
    }
}
