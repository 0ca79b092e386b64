//! Render-ready panel state and the sink that draws it.

use crate::cache::InputIcon;
use crate::connection::ConnectionState;
use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputButton {
    pub active: bool,
    pub pending: bool,
}

impl OutputButton {
    pub fn stream_icon(self) -> &'static str {
        if self.active {
            "stop_circle"
        } else {
            "podcasts"
        }
    }

    pub fn record_icon(self) -> &'static str {
        if self.active {
            "stop_circle"
        } else {
            "fiber_manual_record"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayIndicator {
    #[default]
    Idle,
    Pending,
    Saved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MasterMuteButton {
    pub all_muted: bool,
    pub pending: bool,
}

impl MasterMuteButton {
    pub fn label(self) -> &'static str {
        if self.all_muted {
            "All Muted"
        } else {
            "All Sound On"
        }
    }

    pub fn icon(self) -> &'static str {
        if self.all_muted {
            "volume_off"
        } else {
            "volume_up"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemButtons {
    pub stream: OutputButton,
    pub record: OutputButton,
    pub replay: ReplayIndicator,
    pub master_mute: MasterMuteButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneButton {
    pub name: String,
    pub active: bool,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerEntry {
    pub name: String,
    pub icon: InputIcon,
    pub glyph: &'static str,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundButton {
    pub index: usize,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub connection: ConnectionState,
    pub timer: String,
    pub system: SystemButtons,
    pub scenes: Vec<SceneButton>,
    pub mixer: Vec<MixerEntry>,
    pub soundboard: Vec<SoundButton>,
    pub layout_locked: bool,
}

impl PanelView {
    pub fn status_text(&self) -> &'static str {
        self.connection.status_text()
    }
}

/// Which panel sections changed since the last render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dirty {
    pub status: bool,
    pub timer: bool,
    pub system: bool,
    pub scenes: bool,
    pub mixer: bool,
    pub soundboard: bool,
}

impl Dirty {
    pub const NONE: Dirty = Dirty {
        status: false,
        timer: false,
        system: false,
        scenes: false,
        mixer: false,
        soundboard: false,
    };

    pub const ALL: Dirty = Dirty {
        status: true,
        timer: true,
        system: true,
        scenes: true,
        mixer: true,
        soundboard: true,
    };

    pub fn any(self) -> bool {
        self != Dirty::NONE
    }

    pub fn merge(&mut self, other: Dirty) {
        self.status |= other.status;
        self.timer |= other.timer;
        self.system |= other.system;
        self.scenes |= other.scenes;
        self.mixer |= other.mixer;
        self.soundboard |= other.soundboard;
    }
}

/// User-facing failures. They never change cached state.
#[derive(Debug, Clone)]
pub enum Notice {
    ConnectFailed(String),
    CommandFailed {
        action: String,
        error: RequestError,
    },
    SoundFailed {
        name: String,
        error: RequestError,
    },
    ReplayFailed(RequestError),
    MutePartial {
        failed: Vec<String>,
        target_muted: bool,
    },
    Invalid(String),
}

pub trait RenderSink: Send {
    fn render(&mut self, view: &PanelView, dirty: Dirty);

    fn notify(&mut self, _notice: Notice) {}
}
