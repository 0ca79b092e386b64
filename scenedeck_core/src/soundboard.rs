//! Locally owned soundboard buttons. Entries are identified by position;
//! duplicate names are allowed.

use crate::prefs::{PreferenceStore, PrefsError};
use scenedeck_protocol::{MediaAction, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SOUND_ICON: &str = "play_arrow";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CustomSound {
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_icon() -> String {
    DEFAULT_SOUND_ICON.to_string()
}

impl CustomSound {
    /// Trims both fields; a blank icon falls back to the default.
    pub fn new(name: &str, icon: &str) -> Result<Self, SoundboardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SoundboardError::EmptyName);
        }
        let icon = match icon.trim() {
            "" => DEFAULT_SOUND_ICON,
            i => i,
        };
        Ok(Self {
            name: name.to_string(),
            icon: icon.to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub enum SoundboardError {
    #[error("sound name is required")]
    EmptyName,
    #[error("no sound at position {0}")]
    OutOfRange(usize),
    #[error("sound at position {index} is no longer `{name}`")]
    Stale { index: usize, name: String },
    #[error(transparent)]
    Prefs(#[from] PrefsError),
}

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Proof that the user agreed to delete one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalConfirmed {
    index: usize,
    name: String,
}

impl RemovalConfirmed {
    pub fn ask(confirm: &mut dyn Confirm, index: usize, name: &str) -> Option<Self> {
        confirm
            .confirm(&format!("Delete {name}?"))
            .then(|| Self {
                index,
                name: name.to_string(),
            })
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Proof that the user agreed to empty the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearConfirmed(());

impl ClearConfirmed {
    pub fn ask(confirm: &mut dyn Confirm) -> Option<Self> {
        confirm
            .confirm("Are you sure you want to remove ALL buttons from your soundboard?")
            .then_some(ClearConfirmed(()))
    }
}

#[derive(Debug, Default)]
pub struct Soundboard {
    entries: Vec<CustomSound>,
}

impl Soundboard {
    pub fn load(prefs: &PreferenceStore) -> Self {
        Self {
            entries: prefs.custom_sounds(),
        }
    }

    pub fn entries(&self) -> &[CustomSound] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CustomSound> {
        self.entries.get(index)
    }

    /// Stored before the in-memory list changes, so a failed write leaves both untouched.
    pub fn add(
        &mut self,
        prefs: &mut PreferenceStore,
        name: &str,
        icon: &str,
    ) -> Result<CustomSound, SoundboardError> {
        let sound = CustomSound::new(name, icon)?;
        let mut next = self.entries.clone();
        next.push(sound.clone());
        prefs.set_custom_sounds(&next)?;
        self.entries = next;
        Ok(sound)
    }

    pub fn remove(
        &mut self,
        prefs: &mut PreferenceStore,
        confirmed: RemovalConfirmed,
    ) -> Result<CustomSound, SoundboardError> {
        let index = confirmed.index;
        let current = self
            .entries
            .get(index)
            .ok_or(SoundboardError::OutOfRange(index))?;
        if current.name != confirmed.name {
            return Err(SoundboardError::Stale {
                index,
                name: confirmed.name,
            });
        }
        let mut next = self.entries.clone();
        let removed = next.remove(index);
        prefs.set_custom_sounds(&next)?;
        self.entries = next;
        Ok(removed)
    }

    pub fn clear(
        &mut self,
        prefs: &mut PreferenceStore,
        _confirmed: ClearConfirmed,
    ) -> Result<usize, SoundboardError> {
        prefs.set_custom_sounds(&[])?;
        Ok(std::mem::take(&mut self.entries).len())
    }
}

/// Restarts the media input named like the sound.
pub fn trigger_request(sound: &CustomSound) -> Request {
    Request::TriggerMediaInputAction {
        input_name: sound.name.clone(),
        media_action: MediaAction::Restart,
    }
}
