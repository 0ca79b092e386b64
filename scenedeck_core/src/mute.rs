use crate::cache::AudioInput;
use crate::error::RequestError;
use crate::remote::{call_typed, ObsRemote};
use scenedeck_protocol::{InputMuteResponse, Request};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalMuteState {
    UnmutedOrMixed,
    AllMuted,
}

impl GlobalMuteState {
    /// Mute wins only when every input is already muted. No inputs counts as unmuted.
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut seen = false;
        for muted in flags {
            if !muted {
                return GlobalMuteState::UnmutedOrMixed;
            }
            seen = true;
        }
        if seen {
            GlobalMuteState::AllMuted
        } else {
            GlobalMuteState::UnmutedOrMixed
        }
    }

    pub fn target_muted(self) -> bool {
        matches!(self, GlobalMuteState::UnmutedOrMixed)
    }
}

#[derive(Debug, Clone)]
pub struct MuteReport {
    pub target_muted: bool,
    pub applied: Vec<String>,
    pub failed: Vec<(String, RequestError)>,
}

impl MuteReport {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Polls every known input, picks one target flag, then sets it on each input
/// independently. Failures are collected, never rolled back.
pub async fn toggle_global_mute(remote: &dyn ObsRemote, known: &[AudioInput]) -> MuteReport {
    let mut flags = Vec::with_capacity(known.len());
    for input in known {
        let request = Request::GetInputMute {
            input_name: input.name.clone(),
        };
        match call_typed::<InputMuteResponse>(remote, request).await {
            Ok(resp) => flags.push(resp.input_muted),
            Err(e) => {
                debug!(input = %input.name, error = %e, "mute poll failed, using cached flag");
                flags.push(input.is_muted);
            }
        }
    }

    let target_muted = GlobalMuteState::from_flags(flags).target_muted();
    let mut report = MuteReport {
        target_muted,
        applied: Vec::new(),
        failed: Vec::new(),
    };

    for input in known {
        let request = Request::SetInputMute {
            input_name: input.name.clone(),
            input_muted: target_muted,
        };
        match remote.call(request).await {
            Ok(_) => report.applied.push(input.name.clone()),
            Err(e) => {
                warn!(input = %input.name, error = %e, "set mute failed");
                report.failed.push((input.name.clone(), e));
            }
        }
    }
    report
}
