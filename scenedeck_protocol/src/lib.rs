mod auth;
mod event;
mod request;
mod response;

pub use auth::auth_response;
pub use event::Event;
pub use request::{MediaAction, Request};
pub use response::{
    InputItem, InputListResponse, InputMuteResponse, OutputStatusResponse, SceneItem,
    SceneListResponse,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const RPC_VERSION: u32 = 1;
pub const DEFAULT_PORT: &str = "4455";
pub const AUTH_FAILED_CLOSE_CODE: u16 = 4009;
pub const STATUS_SUCCESS: u32 = 100;

pub mod op {
    pub const HELLO: u8 = 0;
    pub const IDENTIFY: u8 = 1;
    pub const IDENTIFIED: u8 = 2;
    pub const EVENT: u8 = 5;
    pub const REQUEST: u8 = 6;
    pub const REQUEST_RESPONSE: u8 = 7;
}

/// Event subscription bits for the Identify message.
pub mod subscriptions {
    pub const GENERAL: u32 = 1 << 0;
    pub const CONFIG: u32 = 1 << 1;
    pub const SCENES: u32 = 1 << 2;
    pub const INPUTS: u32 = 1 << 3;
    pub const TRANSITIONS: u32 = 1 << 4;
    pub const FILTERS: u32 = 1 << 5;
    pub const OUTPUTS: u32 = 1 << 6;
    pub const SCENE_ITEMS: u32 = 1 << 7;
    pub const MEDIA_INPUTS: u32 = 1 << 8;
    pub const VENDORS: u32 = 1 << 9;
    pub const UI: u32 = 1 << 10;

    /// Every category that is not flagged high-volume.
    pub const ALL: u32 = GENERAL
        | CONFIG
        | SCENES
        | INPUTS
        | TRANSITIONS
        | FILTERS
        | OUTPUTS
        | SCENE_ITEMS
        | MEDIA_INPUTS
        | VENDORS
        | UI;
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected op code {0}")]
    UnexpectedOp(u8),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    op: u8,
    d: T,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(default)]
    pub event_subscriptions: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RequestStatus {
    pub fn success() -> Self {
        Self {
            result: true,
            code: STATUS_SUCCESS,
            comment: None,
        }
    }

    pub fn failure(code: u32, comment: impl Into<String>) -> Self {
        Self {
            result: false,
            code,
            comment: Some(comment.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Hello(Hello),
    Identified(Identified),
    Event(Event),
    RequestResponse(RequestResponse),
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope<Value> = serde_json::from_str(text)?;
        let msg = match envelope.op {
            op::HELLO => ServerMessage::Hello(serde_json::from_value(envelope.d)?),
            op::IDENTIFIED => ServerMessage::Identified(serde_json::from_value(envelope.d)?),
            op::EVENT => ServerMessage::Event(Event::from_wire(envelope.d)?),
            op::REQUEST_RESPONSE => {
                ServerMessage::RequestResponse(serde_json::from_value(envelope.d)?)
            }
            other => return Err(ProtocolError::UnexpectedOp(other)),
        };
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let (op, d) = match self {
            ServerMessage::Hello(m) => (op::HELLO, serde_json::to_value(m)?),
            ServerMessage::Identified(m) => (op::IDENTIFIED, serde_json::to_value(m)?),
            ServerMessage::Event(e) => (op::EVENT, e.to_wire()?),
            ServerMessage::RequestResponse(m) => (op::REQUEST_RESPONSE, serde_json::to_value(m)?),
        };
        Ok(serde_json::to_string(&Envelope { op, d })?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Identify(Identify),
    Request { request_id: String, request: Request },
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let (op, d) = match self {
            ClientMessage::Identify(m) => (op::IDENTIFY, serde_json::to_value(m)?),
            ClientMessage::Request {
                request_id,
                request,
            } => {
                let mut d = serde_json::to_value(request)?;
                if let Value::Object(map) = &mut d {
                    map.insert("requestId".to_string(), Value::String(request_id.clone()));
                }
                (op::REQUEST, d)
            }
        };
        Ok(serde_json::to_string(&Envelope { op, d })?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope<Value> = serde_json::from_str(text)?;
        match envelope.op {
            op::IDENTIFY => Ok(ClientMessage::Identify(serde_json::from_value(envelope.d)?)),
            op::REQUEST => {
                let mut d = envelope.d;
                let request_id = d
                    .as_object_mut()
                    .and_then(|m| m.remove("requestId"))
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or(ProtocolError::MissingField("requestId"))?;
                let request = serde_json::from_value(d)?;
                Ok(ClientMessage::Request {
                    request_id,
                    request,
                })
            }
            other => Err(ProtocolError::UnexpectedOp(other)),
        }
    }
}
