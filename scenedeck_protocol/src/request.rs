use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "requestType",
    content = "requestData",
    rename_all_fields = "camelCase"
)]
pub enum Request {
    GetSceneList,
    SetCurrentProgramScene {
        scene_name: String,
    },
    GetInputList,
    GetInputMute {
        input_name: String,
    },
    SetInputMute {
        input_name: String,
        input_muted: bool,
    },
    ToggleInputMute {
        input_name: String,
    },
    ToggleStream,
    ToggleRecord,
    SaveReplayBuffer,
    TriggerMediaInputAction {
        input_name: String,
        media_action: MediaAction,
    },
    GetStreamStatus,
    GetRecordStatus,
}

impl Request {
    pub fn request_type(&self) -> &'static str {
        match self {
            Request::GetSceneList => "GetSceneList",
            Request::SetCurrentProgramScene { .. } => "SetCurrentProgramScene",
            Request::GetInputList => "GetInputList",
            Request::GetInputMute { .. } => "GetInputMute",
            Request::SetInputMute { .. } => "SetInputMute",
            Request::ToggleInputMute { .. } => "ToggleInputMute",
            Request::ToggleStream => "ToggleStream",
            Request::ToggleRecord => "ToggleRecord",
            Request::SaveReplayBuffer => "SaveReplayBuffer",
            Request::TriggerMediaInputAction { .. } => "TriggerMediaInputAction",
            Request::GetStreamStatus => "GetStreamStatus",
            Request::GetRecordStatus => "GetRecordStatus",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_NONE")]
    None,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_PLAY")]
    Play,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_PAUSE")]
    Pause,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_STOP")]
    Stop,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_RESTART")]
    Restart,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_NEXT")]
    Next,
    #[serde(rename = "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_PREVIOUS")]
    Previous,
}
