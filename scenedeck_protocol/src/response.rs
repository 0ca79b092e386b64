use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    pub scene_name: String,
    #[serde(default)]
    pub scene_index: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneListResponse {
    #[serde(default)]
    pub current_program_scene_name: Option<String>,
    #[serde(default)]
    pub current_preview_scene_name: Option<String>,
    pub scenes: Vec<SceneItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputItem {
    pub input_name: String,
    pub input_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unversioned_input_kind: Option<String>,
}

impl InputItem {
    /// The kind without a version suffix, falling back to the raw kind.
    pub fn base_kind(&self) -> &str {
        self.unversioned_input_kind
            .as_deref()
            .unwrap_or(&self.input_kind)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputListResponse {
    pub inputs: Vec<InputItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputMuteResponse {
    pub input_muted: bool,
}

/// Shared by `GetStreamStatus`, `GetRecordStatus`, `ToggleStream` and `ToggleRecord`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputStatusResponse {
    pub output_active: bool,
}
