use async_trait::async_trait;
use scenedeck_core::cache::{AudioInput, AudioKind};
use scenedeck_core::mute::{toggle_global_mute, GlobalMuteState};
use scenedeck_core::{Epoch, ObsRemote, RequestError};
use scenedeck_protocol::Request;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct FakeRemote {
    muted: Mutex<HashMap<String, bool>>,
    refuse_set: HashSet<String>,
    refuse_get: HashSet<String>,
    calls: Mutex<Vec<Request>>,
}

impl FakeRemote {
    fn with(inputs: &[(&str, bool)]) -> Self {
        let remote = FakeRemote::default();
        {
            let mut muted = remote.muted.lock().unwrap();
            for (name, flag) in inputs {
                muted.insert(name.to_string(), *flag);
            }
        }
        remote
    }

    fn sets(&self) -> Vec<(String, bool)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| match r {
                Request::SetInputMute {
                    input_name,
                    input_muted,
                } => Some((input_name.clone(), *input_muted)),
                _ => None,
            })
            .collect()
    }
}

fn refused(request: &Request) -> RequestError {
    RequestError::Failed {
        request_type: request.request_type().to_string(),
        code: 604,
        comment: "not audio".to_string(),
    }
}

#[async_trait]
impl ObsRemote for FakeRemote {
    fn epoch(&self) -> Epoch {
        Epoch(1)
    }

    async fn call(&self, request: Request) -> Result<Option<Value>, RequestError> {
        self.calls.lock().unwrap().push(request.clone());
        match &request {
            Request::GetInputMute { input_name } => {
                if self.refuse_get.contains(input_name) {
                    return Err(refused(&request));
                }
                let muted = self.muted.lock().unwrap()[input_name];
                Ok(Some(json!({ "inputMuted": muted })))
            }
            Request::SetInputMute {
                input_name,
                input_muted,
            } => {
                if self.refuse_set.contains(input_name) {
                    return Err(refused(&request));
                }
                self.muted
                    .lock()
                    .unwrap()
                    .insert(input_name.clone(), *input_muted);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn close(&self) {}
}

fn known(inputs: &[(&str, bool)]) -> Vec<AudioInput> {
    inputs
        .iter()
        .map(|(name, muted)| AudioInput::new(*name, AudioKind::PulseInputCapture, *muted))
        .collect()
}

#[test]
fn mute_wins_only_when_everything_is_muted() {
    assert_eq!(GlobalMuteState::from_flags([true, true]), GlobalMuteState::AllMuted);
    assert_eq!(
        GlobalMuteState::from_flags([true, false]),
        GlobalMuteState::UnmutedOrMixed
    );
    assert_eq!(
        GlobalMuteState::from_flags(std::iter::empty()),
        GlobalMuteState::UnmutedOrMixed
    );
    assert!(GlobalMuteState::UnmutedOrMixed.target_muted());
    assert!(!GlobalMuteState::AllMuted.target_muted());
}

#[tokio::test]
async fn any_unmuted_input_mutes_everything() {
    let inputs = [("Mic", true), ("Desktop", false), ("Music", true)];
    let remote = FakeRemote::with(&inputs);

    let report = toggle_global_mute(&remote, &known(&inputs)).await;
    assert!(report.target_muted);
    assert!(!report.is_partial());
    assert_eq!(
        remote.sets(),
        [
            ("Mic".to_string(), true),
            ("Desktop".to_string(), true),
            ("Music".to_string(), true)
        ]
    );
}

#[tokio::test]
async fn all_muted_inputs_are_unmuted() {
    let inputs = [("Mic", true), ("Desktop", true)];
    let remote = FakeRemote::with(&inputs);

    let report = toggle_global_mute(&remote, &known(&inputs)).await;
    assert!(!report.target_muted);
    assert_eq!(report.applied, ["Mic", "Desktop"]);
    assert!(remote.muted.lock().unwrap().values().all(|m| !m));
}

#[tokio::test]
async fn remote_flags_beat_a_stale_cache() {
    // cache says all muted, remote says Desktop was unmuted meanwhile
    let remote = FakeRemote::with(&[("Mic", true), ("Desktop", false)]);
    let report = toggle_global_mute(&remote, &known(&[("Mic", true), ("Desktop", true)])).await;
    assert!(report.target_muted);
}

#[tokio::test]
async fn failed_poll_falls_back_to_the_cached_flag() {
    let mut remote = FakeRemote::with(&[("Mic", true), ("Desktop", true)]);
    remote.refuse_get.insert("Desktop".to_string());
    let report = toggle_global_mute(&remote, &known(&[("Mic", true), ("Desktop", false)])).await;
    assert!(report.target_muted);
}

#[tokio::test]
async fn partial_failure_is_reported_without_rollback() {
    let inputs = [("Mic", false), ("Broken", false), ("Desktop", false)];
    let mut remote = FakeRemote::with(&inputs);
    remote.refuse_set.insert("Broken".to_string());

    let report = toggle_global_mute(&remote, &known(&inputs)).await;
    assert!(report.is_partial());
    assert_eq!(report.applied, ["Mic", "Desktop"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Broken");
    assert_eq!(remote.sets().len(), 3);
    let muted = remote.muted.lock().unwrap();
    assert!(muted["Mic"] && muted["Desktop"] && !muted["Broken"]);
}

#[tokio::test]
async fn no_known_inputs_means_no_calls() {
    let remote = FakeRemote::default();
    let report = toggle_global_mute(&remote, &[]).await;
    assert!(report.target_muted);
    assert!(report.applied.is_empty());
    assert!(remote.calls.lock().unwrap().is_empty());
}
