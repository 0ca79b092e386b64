//! Fetches that populate the cache right after a session is identified.

use crate::cache::{AudioInput, AudioKind, SceneSnapshot};
use crate::error::RequestError;
use crate::remote::{call_typed, ObsRemote};
use scenedeck_protocol::{
    InputListResponse, InputMuteResponse, OutputStatusResponse, Request, SceneListResponse,
};
use tracing::{debug, warn};

pub async fn fetch_scenes(remote: &dyn ObsRemote) -> Result<SceneSnapshot, RequestError> {
    let resp: SceneListResponse = call_typed(remote, Request::GetSceneList).await?;
    Ok(SceneSnapshot {
        names: resp.scenes.into_iter().map(|s| s.scene_name).collect(),
        current: resp.current_program_scene_name,
    })
}

/// Recognized audio inputs with their mute flag. An input whose mute query fails is left out.
pub async fn fetch_mixer(remote: &dyn ObsRemote) -> Result<Vec<AudioInput>, RequestError> {
    let list: InputListResponse = call_typed(remote, Request::GetInputList).await?;
    let mut inputs = Vec::new();
    for item in list.inputs {
        let Some(kind) = AudioKind::recognize(item.base_kind()) else {
            debug!(input = %item.input_name, kind = %item.input_kind, "skipping non-audio input");
            continue;
        };
        let request = Request::GetInputMute {
            input_name: item.input_name.clone(),
        };
        match call_typed::<InputMuteResponse>(remote, request).await {
            Ok(mute) => inputs.push(AudioInput::new(item.input_name, kind, mute.input_muted)),
            Err(RequestError::SessionClosed) => return Err(RequestError::SessionClosed),
            Err(e) => warn!(input = %item.input_name, error = %e, "omitting input from mixer"),
        }
    }
    Ok(inputs)
}

pub async fn fetch_stream_active(remote: &dyn ObsRemote) -> Result<bool, RequestError> {
    let status: OutputStatusResponse = call_typed(remote, Request::GetStreamStatus).await?;
    Ok(status.output_active)
}

pub async fn fetch_record_active(remote: &dyn ObsRemote) -> Result<bool, RequestError> {
    let status: OutputStatusResponse = call_typed(remote, Request::GetRecordStatus).await?;
    Ok(status.output_active)
}
