//! Merges the remote cache with locally saved ordering into render-ready lists.

use crate::cache::{Activity, AudioInput, Scene};
use crate::mute::GlobalMuteState;
use crate::prefs::PrefsError;
use crate::render::{
    MasterMuteButton, MixerEntry, OutputButton, ReplayIndicator, SceneButton, SoundButton,
    SystemButtons,
};
use crate::soundboard::CustomSound;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("layout is locked")]
    LayoutLocked,
    #[error("position {index} is outside the {len} rendered scenes")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Prefs(#[from] PrefsError),
}

/// Scenes named in `saved` come first, in saved order. The rest follow in
/// remote order. Saved names with no live scene are ignored.
pub fn order_scenes(mut scenes: Vec<Scene>, saved: &[String]) -> Vec<Scene> {
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(saved.len());
    for (i, name) in saved.iter().enumerate() {
        rank.entry(name.as_str()).or_insert(i);
    }
    // sort_by_key is stable; unranked scenes keep their relative order
    scenes.sort_by_key(|s| rank.get(s.name.as_str()).copied().unwrap_or(usize::MAX));
    scenes
}

/// The order to persist after a manual reorder. Names in `previous` that are
/// not rendered right now are kept, each right after the live name it followed.
pub fn write_back(rendered: &[String], previous: &[String]) -> Vec<String> {
    let live: HashSet<&str> = rendered.iter().map(String::as_str).collect();
    let mut leading = Vec::new();
    let mut trailing: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut anchor: Option<&str> = None;

    for name in previous {
        if live.contains(name.as_str()) {
            anchor = Some(name.as_str());
            continue;
        }
        match anchor {
            Some(a) => trailing.entry(a).or_default().push(name.as_str()),
            None => leading.push(name.as_str()),
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(rendered.len() + previous.len());
    for name in leading {
        push_unique(&mut seen, &mut out, name);
    }
    for name in rendered {
        push_unique(&mut seen, &mut out, name);
        for dead in trailing.get(name.as_str()).into_iter().flatten() {
            push_unique(&mut seen, &mut out, *dead);
        }
    }
    out
}

fn push_unique<'a>(seen: &mut HashSet<&'a str>, out: &mut Vec<String>, name: &'a str) {
    if seen.insert(name) {
        out.push(name.to_string());
    }
}

/// Moves the item at `from` to `to`, shifting the ones in between.
pub fn move_item(order: &[String], from: usize, to: usize) -> Result<Vec<String>, ReorderError> {
    let len = order.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::OutOfRange { index, len });
        }
    }
    let mut next = order.to_vec();
    let item = next.remove(from);
    next.insert(to, item);
    Ok(next)
}

pub fn scene_buttons(ordered: &[Scene], pending: Option<&str>) -> Vec<SceneButton> {
    ordered
        .iter()
        .map(|s| SceneButton {
            name: s.name.clone(),
            active: s.is_active,
            pending: pending == Some(s.name.as_str()),
        })
        .collect()
}

pub fn mixer_entries(inputs: &[AudioInput]) -> Vec<MixerEntry> {
    inputs
        .iter()
        .map(|i| MixerEntry {
            name: i.name.clone(),
            icon: i.icon,
            glyph: i.icon.glyph(i.is_muted),
            muted: i.is_muted,
        })
        .collect()
}

pub fn sound_buttons(sounds: &[CustomSound]) -> Vec<SoundButton> {
    sounds
        .iter()
        .enumerate()
        .map(|(index, s)| SoundButton {
            index,
            name: s.name.clone(),
            icon: s.icon.clone(),
        })
        .collect()
}

pub struct SystemPending {
    pub stream: bool,
    pub record: bool,
    pub global_mute: bool,
    pub replay: ReplayIndicator,
}

pub fn system_buttons(
    activity: Activity,
    inputs: &[AudioInput],
    pending: &SystemPending,
) -> SystemButtons {
    let mute = GlobalMuteState::from_flags(inputs.iter().map(|i| i.is_muted));
    SystemButtons {
        stream: OutputButton {
            active: activity.streaming,
            pending: pending.stream,
        },
        record: OutputButton {
            active: activity.recording,
            pending: pending.record,
        },
        replay: pending.replay,
        master_mute: MasterMuteButton {
            all_muted: mute == GlobalMuteState::AllMuted,
            pending: pending.global_mute,
        },
    }
}
