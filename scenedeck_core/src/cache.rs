//! In-memory mirror of the remote scene list, audio inputs and output activity.

/// Audio input kinds shown in the mixer. Anything else is never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioKind {
    AlsaInputCapture,
    FfmpegSource,
    PipewireClient,
    PulseInputCapture,
    PulseOutputCapture,
    VlcSource,
    WasapiInputCapture,
    WasapiOutputCapture,
    WasapiProcessOutputCapture,
    CoreAudioInputCapture,
    CoreAudioOutputCapture,
}

impl AudioKind {
    pub const ALL: [AudioKind; 11] = [
        AudioKind::AlsaInputCapture,
        AudioKind::FfmpegSource,
        AudioKind::PipewireClient,
        AudioKind::PulseInputCapture,
        AudioKind::PulseOutputCapture,
        AudioKind::VlcSource,
        AudioKind::WasapiInputCapture,
        AudioKind::WasapiOutputCapture,
        AudioKind::WasapiProcessOutputCapture,
        AudioKind::CoreAudioInputCapture,
        AudioKind::CoreAudioOutputCapture,
    ];

    pub fn id(self) -> &'static str {
        match self {
            AudioKind::AlsaInputCapture => "alsa_input_capture",
            AudioKind::FfmpegSource => "ffmpeg_source",
            AudioKind::PipewireClient => "pipewire-audio-client-external",
            AudioKind::PulseInputCapture => "pulse_input_capture",
            AudioKind::PulseOutputCapture => "pulse_output_capture",
            AudioKind::VlcSource => "vlc_source",
            AudioKind::WasapiInputCapture => "wasapi_input_capture",
            AudioKind::WasapiOutputCapture => "wasapi_output_capture",
            AudioKind::WasapiProcessOutputCapture => "wasapi_process_output_capture",
            AudioKind::CoreAudioInputCapture => "coreaudio_input_capture",
            AudioKind::CoreAudioOutputCapture => "coreaudio_output_capture",
        }
    }

    pub fn recognize(kind: &str) -> Option<AudioKind> {
        AudioKind::ALL.into_iter().find(|k| k.id() == kind)
    }

    /// File-backed sources.
    pub fn is_media(self) -> bool {
        matches!(self, AudioKind::FfmpegSource | AudioKind::VlcSource)
    }

    pub fn is_capture_input(self) -> bool {
        self.id().contains("input")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIcon {
    Microphone,
    Note,
    Speaker,
}

impl InputIcon {
    pub fn infer(kind: AudioKind, name: &str) -> InputIcon {
        if kind.is_media() {
            InputIcon::Note
        } else if kind.is_capture_input() || name.to_lowercase().contains("mic") {
            InputIcon::Microphone
        } else {
            InputIcon::Speaker
        }
    }

    pub fn glyph(self, muted: bool) -> &'static str {
        match (self, muted) {
            (InputIcon::Microphone, false) => "mic",
            (InputIcon::Microphone, true) => "mic_off",
            (InputIcon::Speaker, false) => "volume_up",
            (InputIcon::Speaker, true) => "volume_off",
            (InputIcon::Note, _) => "music_note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    pub name: String,
    pub kind: AudioKind,
    pub icon: InputIcon,
    pub is_muted: bool,
}

impl AudioInput {
    pub fn new(name: impl Into<String>, kind: AudioKind, is_muted: bool) -> Self {
        let name = name.into();
        let icon = InputIcon::infer(kind, &name);
        Self {
            name,
            kind,
            icon,
            is_muted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub streaming: bool,
    pub recording: bool,
}

impl Activity {
    pub fn any(self) -> bool {
        self.streaming || self.recording
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub name: String,
    pub is_active: bool,
}

/// Scene names in remote order plus the current program scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSnapshot {
    pub names: Vec<String>,
    pub current: Option<String>,
}

#[derive(Debug, Default)]
pub struct RemoteStateCache {
    scenes: Vec<String>,
    current_scene: Option<String>,
    inputs: Vec<AudioInput>,
    activity: Activity,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scenes in remote order; at most one is active.
    pub fn scenes(&self) -> Vec<Scene> {
        self.scenes
            .iter()
            .map(|name| Scene {
                name: name.clone(),
                is_active: self.current_scene.as_deref() == Some(name.as_str()),
            })
            .collect()
    }

    pub fn scene_names(&self) -> &[String] {
        &self.scenes
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    pub fn replace_scenes(&mut self, snapshot: SceneSnapshot) {
        self.scenes = snapshot.names;
        self.current_scene = snapshot.current;
    }

    /// Returns whether the active scene changed.
    pub fn set_current_scene(&mut self, name: &str) -> bool {
        if self.current_scene.as_deref() == Some(name) {
            return false;
        }
        self.current_scene = Some(name.to_string());
        true
    }

    pub fn inputs(&self) -> &[AudioInput] {
        &self.inputs
    }

    pub fn replace_inputs(&mut self, inputs: Vec<AudioInput>) {
        self.inputs = inputs;
    }

    /// `false` for unknown inputs or an unchanged flag.
    pub fn set_input_muted(&mut self, name: &str, muted: bool) -> bool {
        match self.inputs.iter_mut().find(|i| i.name == name) {
            Some(input) if input.is_muted != muted => {
                input.is_muted = muted;
                true
            }
            _ => false,
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn set_streaming(&mut self, active: bool) -> bool {
        let changed = self.activity.streaming != active;
        self.activity.streaming = active;
        changed
    }

    pub fn set_recording(&mut self, active: bool) -> bool {
        let changed = self.activity.recording != active;
        self.activity.recording = active;
        changed
    }

    pub fn forget_activity(&mut self) -> bool {
        let changed = self.activity.any();
        self.activity = Activity::default();
        changed
    }
}
