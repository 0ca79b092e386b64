//! The single owner of panel state. Everything that changes it arrives as a message.

use crate::bootstrap;
use crate::cache::{AudioInput, RemoteStateCache, Scene, SceneSnapshot};
use crate::config::{ConnectionSettings, DeckConfig};
use crate::connection::{ConnectionManager, Epoch};
use crate::error::{ConnectError, RequestError};
use crate::mute::{self, MuteReport};
use crate::prefs::{PreferenceStore, PrefsError};
use crate::reconcile::{self, ReorderError, SystemPending};
use crate::remote::{Connector, ObsRemote};
use crate::render::{Dirty, Notice, PanelView, RenderSink, ReplayIndicator};
use crate::session::SessionSignal;
use crate::soundboard::{
    trigger_request, ClearConfirmed, CustomSound, RemovalConfirmed, Soundboard, SoundboardError,
};
use crate::timer::ElapsedTimer;
use scenedeck_protocol::{Event, Request};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_QUEUE: usize = 32;

pub enum Command {
    /// Save the settings, then connect with them.
    Connect(ConnectionSettings),
    Reconnect,
    Disconnect,
    ToggleStream,
    ToggleRecord,
    SaveReplay,
    SetScene(String),
    ToggleInputMute(String),
    SetInputMuted {
        name: String,
        muted: bool,
    },
    ToggleGlobalMute,
    TriggerSound(usize),
    AddSound {
        name: String,
        icon: String,
        reply: oneshot::Sender<Result<CustomSound, SoundboardError>>,
    },
    RemoveSound {
        confirmed: RemovalConfirmed,
        reply: oneshot::Sender<Result<CustomSound, SoundboardError>>,
    },
    ClearSounds {
        confirmed: ClearConfirmed,
        reply: oneshot::Sender<Result<usize, SoundboardError>>,
    },
    MoveScene {
        from: usize,
        to: usize,
        reply: oneshot::Sender<Result<Vec<String>, ReorderError>>,
    },
    SetLayoutLock {
        locked: bool,
        reply: oneshot::Sender<Result<(), PrefsError>>,
    },
    Snapshot {
        reply: oneshot::Sender<PanelView>,
    },
    Shutdown,
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("controller has stopped")]
    Stopped,
    #[error(transparent)]
    Soundboard(#[from] SoundboardError),
    #[error(transparent)]
    Reorder(#[from] ReorderError),
    #[error(transparent)]
    Prefs(#[from] PrefsError),
}

#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
}

impl ControllerHandle {
    pub async fn send(&self, command: Command) -> Result<(), ControlError> {
        self.tx.send(command).await.map_err(|_| ControlError::Stopped)
    }

    /// For callers outside the runtime, such as a stdin reader thread.
    pub fn blocking_send(&self, command: Command) -> Result<(), ControlError> {
        self.tx
            .blocking_send(command)
            .map_err(|_| ControlError::Stopped)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| ControlError::Stopped)
    }

    pub async fn connect(&self, settings: ConnectionSettings) -> Result<(), ControlError> {
        self.send(Command::Connect(settings)).await
    }

    pub async fn disconnect(&self) -> Result<(), ControlError> {
        self.send(Command::Disconnect).await
    }

    pub async fn add_sound(
        &self,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<CustomSound, ControlError> {
        let (name, icon) = (name.into(), icon.into());
        Ok(self
            .request(|reply| Command::AddSound { name, icon, reply })
            .await??)
    }

    pub async fn remove_sound(&self, confirmed: RemovalConfirmed) -> Result<CustomSound, ControlError> {
        Ok(self
            .request(|reply| Command::RemoveSound { confirmed, reply })
            .await??)
    }

    pub async fn clear_sounds(&self, confirmed: ClearConfirmed) -> Result<usize, ControlError> {
        Ok(self
            .request(|reply| Command::ClearSounds { confirmed, reply })
            .await??)
    }

    pub async fn move_scene(&self, from: usize, to: usize) -> Result<Vec<String>, ControlError> {
        Ok(self
            .request(|reply| Command::MoveScene { from, to, reply })
            .await??)
    }

    pub async fn set_layout_locked(&self, locked: bool) -> Result<(), ControlError> {
        Ok(self
            .request(|reply| Command::SetLayoutLock { locked, reply })
            .await??)
    }

    pub async fn snapshot(&self) -> Result<PanelView, ControlError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), ControlError> {
        self.send(Command::Shutdown).await
    }
}

enum Signal {
    ConnectFinished {
        epoch: Epoch,
        result: Result<Arc<dyn ObsRemote>, ConnectError>,
    },
    Completed {
        epoch: Epoch,
        completion: Completion,
    },
    RetryTick(u64),
    ElapsedTick(u64),
}

enum Completion {
    Scenes(Result<SceneSnapshot, RequestError>),
    Mixer(Result<Vec<AudioInput>, RequestError>),
    StreamActive(Result<bool, RequestError>),
    RecordActive(Result<bool, RequestError>),
    Command {
        action: Action,
        result: Result<(), RequestError>,
    },
    GlobalMute(MuteReport),
}

enum Action {
    ToggleStream,
    ToggleRecord,
    SaveReplay,
    SetScene(String),
    ToggleInputMute(String),
    SetInputMuted(String),
    TriggerSound(String),
}

impl Action {
    fn label(&self) -> String {
        match self {
            Action::ToggleStream => "toggle stream".to_string(),
            Action::ToggleRecord => "toggle record".to_string(),
            Action::SaveReplay => "save replay".to_string(),
            Action::SetScene(name) => format!("switch to scene {name}"),
            Action::ToggleInputMute(name) | Action::SetInputMuted(name) => format!("mute {name}"),
            Action::TriggerSound(name) => format!("play {name}"),
        }
    }
}

/// In-flight markers. Never used to flip the displayed on/off state.
#[derive(Debug, Default)]
struct Pending {
    stream: bool,
    record: bool,
    global_mute: bool,
    replay: ReplayIndicator,
    scene: Option<String>,
}

pub struct Controller {
    prefs: PreferenceStore,
    connector: Arc<dyn Connector>,
    sink: Box<dyn RenderSink>,
    connection: ConnectionManager,
    cache: RemoteStateCache,
    timer: ElapsedTimer,
    soundboard: Soundboard,
    scene_order: Vec<String>,
    layout_locked: bool,
    settings: Option<ConnectionSettings>,
    session: Option<Arc<dyn ObsRemote>>,
    pending: Pending,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
    session_tx: mpsc::UnboundedSender<SessionSignal>,
    session_rx: mpsc::UnboundedReceiver<SessionSignal>,
}

impl Controller {
    pub fn new(
        config: DeckConfig,
        prefs: PreferenceStore,
        connector: Arc<dyn Connector>,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        Self {
            soundboard: Soundboard::load(&prefs),
            scene_order: prefs.scene_order().unwrap_or_default(),
            layout_locked: prefs.layout_locked(),
            settings: prefs.connection_settings(),
            prefs,
            connector,
            sink,
            connection: ConnectionManager::new(config.retry_interval),
            cache: RemoteStateCache::new(),
            timer: ElapsedTimer::new(config.tick_interval),
            session: None,
            pending: Pending::default(),
            signal_tx,
            signal_rx,
            session_tx,
            session_rx,
        }
    }

    pub fn spawn(self) -> (ControllerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let task = tokio::spawn(self.run(rx));
        (ControllerHandle { tx }, task)
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        self.render(Dirty::ALL);
        if let Some(settings) = self.settings.clone() {
            info!(host = %settings.host, "auto-connecting to saved host");
            self.start_connect(settings);
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(signal) = self.signal_rx.recv() => self.on_signal(signal),
                Some(signal) = self.session_rx.recv() => self.on_session_signal(signal),
            }
        }

        self.teardown();
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Connect(settings) => {
                if let Err(e) = settings.endpoint() {
                    self.sink.notify(Notice::Invalid(e.to_string()));
                    return;
                }
                if let Err(e) = self.prefs.set_connection_settings(&settings) {
                    warn!(error = %e, "failed to save connection settings");
                    self.sink
                        .notify(Notice::Invalid(format!("settings not saved: {e}")));
                }
                self.start_connect(settings);
            }
            Command::Reconnect => match self.settings.clone() {
                Some(settings) => self.start_connect(settings),
                None => self
                    .sink
                    .notify(Notice::Invalid("no host configured".to_string())),
            },
            Command::Disconnect => self.disconnect(),
            Command::ToggleStream => self.issue(Action::ToggleStream, Request::ToggleStream),
            Command::ToggleRecord => self.issue(Action::ToggleRecord, Request::ToggleRecord),
            Command::SaveReplay => self.issue(Action::SaveReplay, Request::SaveReplayBuffer),
            Command::SetScene(name) => {
                let request = Request::SetCurrentProgramScene {
                    scene_name: name.clone(),
                };
                self.issue(Action::SetScene(name), request);
            }
            Command::ToggleInputMute(name) => {
                let request = Request::ToggleInputMute {
                    input_name: name.clone(),
                };
                self.issue(Action::ToggleInputMute(name), request);
            }
            Command::SetInputMuted { name, muted } => {
                let request = Request::SetInputMute {
                    input_name: name.clone(),
                    input_muted: muted,
                };
                self.issue(Action::SetInputMuted(name), request);
            }
            Command::ToggleGlobalMute => self.toggle_global_mute(),
            Command::TriggerSound(index) => match self.soundboard.get(index).cloned() {
                Some(sound) => {
                    let request = trigger_request(&sound);
                    self.issue(Action::TriggerSound(sound.name), request);
                }
                None => self
                    .sink
                    .notify(Notice::Invalid(format!("no sound at position {index}"))),
            },
            Command::AddSound { name, icon, reply } => {
                let result = self.soundboard.add(&mut self.prefs, &name, &icon);
                self.after_soundboard_change(result.is_ok());
                let _ = reply.send(result);
            }
            Command::RemoveSound { confirmed, reply } => {
                let result = self.soundboard.remove(&mut self.prefs, confirmed);
                self.after_soundboard_change(result.is_ok());
                let _ = reply.send(result);
            }
            Command::ClearSounds { confirmed, reply } => {
                let result = self.soundboard.clear(&mut self.prefs, confirmed);
                self.after_soundboard_change(result.is_ok());
                let _ = reply.send(result);
            }
            Command::MoveScene { from, to, reply } => {
                let result = self.move_scene(from, to);
                let _ = reply.send(result);
            }
            Command::SetLayoutLock { locked, reply } => {
                let result = self.prefs.set_layout_locked(locked);
                if result.is_ok() && self.layout_locked != locked {
                    self.layout_locked = locked;
                    self.render(Dirty {
                        scenes: true,
                        ..Dirty::NONE
                    });
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.view());
            }
            Command::Shutdown => {}
        }
    }

    fn on_signal(&mut self, signal: Signal) {
        match signal {
            Signal::ConnectFinished { epoch, result } => self.on_connect_finished(epoch, result),
            Signal::Completed { epoch, completion } => {
                if !self.connection.is_live(epoch) {
                    debug!(%epoch, "dropping completion from stale session");
                    return;
                }
                self.on_completion(completion);
            }
            Signal::RetryTick(generation) => {
                if !self.connection.accepts_retry(generation) {
                    return;
                }
                if let Some(settings) = self.settings.clone() {
                    debug!("retrying connection");
                    self.start_connect(settings);
                }
            }
            Signal::ElapsedTick(generation) => {
                if self.timer.tick(generation) {
                    self.render(Dirty {
                        timer: true,
                        ..Dirty::NONE
                    });
                }
            }
        }
    }

    fn on_session_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::Event { epoch, event } => {
                if !self.connection.is_live(epoch) {
                    debug!(%epoch, event = event.event_type(), "dropping event from stale session");
                    return;
                }
                let dirty = self.dispatch(event);
                self.render(dirty);
            }
            SessionSignal::Closed { epoch } => self.session_lost(epoch),
        }
    }

    /// One handler per event type.
    fn dispatch(&mut self, event: Event) -> Dirty {
        let mut dirty = Dirty::NONE;
        match event {
            Event::StreamStateChanged { output_active, .. } => {
                if self.cache.set_streaming(output_active) {
                    dirty.system = true;
                    dirty.merge(self.sync_timer());
                }
            }
            Event::RecordStateChanged { output_active, .. } => {
                if self.cache.set_recording(output_active) {
                    dirty.system = true;
                    dirty.merge(self.sync_timer());
                }
            }
            Event::InputMuteStateChanged {
                input_name,
                input_muted,
            } => {
                if self.cache.set_input_muted(&input_name, input_muted) {
                    dirty.mixer = true;
                    dirty.system = true;
                }
            }
            Event::CurrentProgramSceneChanged { scene_name } => {
                if self.pending.scene.as_deref() == Some(scene_name.as_str()) {
                    self.pending.scene = None;
                }
                self.cache.set_current_scene(&scene_name);
                dirty.scenes = true;
                // available inputs can differ per scene
                self.refresh_mixer();
            }
            Event::SceneListChanged { .. } => self.refresh_scenes(),
            Event::InputCreated { .. } | Event::InputRemoved { .. } | Event::InputNameChanged { .. } => {
                self.refresh_mixer()
            }
            Event::ExitStarted => info!("remote application is shutting down"),
            Event::Other(event_type) => debug!(%event_type, "ignoring event"),
        }
        dirty
    }

    fn on_completion(&mut self, completion: Completion) {
        let mut dirty = Dirty::NONE;
        match completion {
            Completion::Scenes(Ok(snapshot)) => {
                self.cache.replace_scenes(snapshot);
                dirty.scenes = true;
            }
            Completion::Mixer(Ok(inputs)) => {
                self.cache.replace_inputs(inputs);
                dirty.mixer = true;
                dirty.system = true;
            }
            Completion::StreamActive(Ok(active)) => {
                self.cache.set_streaming(active);
                dirty.system = true;
                dirty.merge(self.sync_timer());
            }
            Completion::RecordActive(Ok(active)) => {
                self.cache.set_recording(active);
                dirty.system = true;
                dirty.merge(self.sync_timer());
            }
            Completion::Scenes(Err(e)) => warn!(error = %e, "scene list fetch failed"),
            Completion::Mixer(Err(e)) => warn!(error = %e, "mixer fetch failed"),
            Completion::StreamActive(Err(e)) => warn!(error = %e, "stream status fetch failed"),
            Completion::RecordActive(Err(e)) => warn!(error = %e, "record status fetch failed"),
            Completion::Command { action, result } => {
                dirty.merge(self.on_command_finished(action, result));
            }
            Completion::GlobalMute(report) => {
                self.pending.global_mute = false;
                dirty.system = true;
                if report.is_partial() {
                    self.sink.notify(Notice::MutePartial {
                        failed: report.failed.into_iter().map(|(name, _)| name).collect(),
                        target_muted: report.target_muted,
                    });
                }
            }
        }
        self.render(dirty);
    }

    fn on_command_finished(&mut self, action: Action, result: Result<(), RequestError>) -> Dirty {
        let mut dirty = Dirty::NONE;
        match &action {
            Action::ToggleStream => {
                self.pending.stream = false;
                dirty.system = true;
            }
            Action::ToggleRecord => {
                self.pending.record = false;
                dirty.system = true;
            }
            Action::SaveReplay => {
                self.pending.replay = if result.is_ok() {
                    ReplayIndicator::Saved
                } else {
                    ReplayIndicator::Failed
                };
                dirty.system = true;
            }
            Action::SetScene(name) => {
                if self.pending.scene.as_deref() == Some(name.as_str()) {
                    self.pending.scene = None;
                    dirty.scenes = true;
                }
            }
            Action::ToggleInputMute(_) | Action::SetInputMuted(_) | Action::TriggerSound(_) => {}
        }

        if let Err(error) = result {
            warn!(action = %action.label(), error = %error, "command failed");
            let notice = match action {
                Action::SaveReplay => Notice::ReplayFailed(error),
                Action::TriggerSound(name) => Notice::SoundFailed { name, error },
                other => Notice::CommandFailed {
                    action: other.label(),
                    error,
                },
            };
            self.sink.notify(notice);
        }
        dirty
    }

    fn on_connect_finished(&mut self, epoch: Epoch, result: Result<Arc<dyn ObsRemote>, ConnectError>) {
        match result {
            Ok(remote) if self.connection.closed_before_connected(epoch) => {
                remote.close();
                self.on_connect_finished(epoch, Err(ConnectError::ClosedEarly));
            }
            Ok(remote) => {
                if !self.connection.on_connected(epoch) {
                    debug!(%epoch, "closing session from superseded attempt");
                    remote.close();
                    return;
                }
                info!(%epoch, "connected");
                self.session = Some(remote.clone());
                self.render(Dirty {
                    status: true,
                    ..Dirty::NONE
                });
                self.bootstrap(remote);
            }
            Err(e) => {
                if !self
                    .connection
                    .on_connect_failed(epoch, &self.signal_tx, Signal::RetryTick)
                {
                    debug!(%epoch, error = %e, "ignoring failure of superseded attempt");
                    return;
                }
                warn!(%epoch, error = %e, "connect failed, retrying");
                self.sink.notify(Notice::ConnectFailed(e.to_string()));
                self.render(Dirty {
                    status: true,
                    ..Dirty::NONE
                });
            }
        }
    }

    fn start_connect(&mut self, settings: ConnectionSettings) {
        if let Err(e) = settings.endpoint() {
            self.sink.notify(Notice::Invalid(e.to_string()));
            return;
        }
        let mut dirty = self.drop_session();
        let epoch = self.connection.begin_attempt();
        info!(%epoch, host = %settings.host, "connecting");
        self.settings = Some(settings.clone());

        let connector = self.connector.clone();
        let signals = self.session_tx.clone();
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let result = connector.connect(&settings, epoch, signals).await;
            let _ = tx.send(Signal::ConnectFinished { epoch, result });
        });

        dirty.status = true;
        self.render(dirty);
    }

    /// Scenes, mixer, then activity. A failed fetch does not stop the next one.
    fn bootstrap(&self, remote: Arc<dyn ObsRemote>) {
        let epoch = remote.epoch();
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let send = |completion| tx.send(Signal::Completed { epoch, completion }).is_ok();
            let remote = &*remote;
            if !send(Completion::Scenes(bootstrap::fetch_scenes(remote).await)) {
                return;
            }
            if !send(Completion::Mixer(bootstrap::fetch_mixer(remote).await)) {
                return;
            }
            if !send(Completion::StreamActive(
                bootstrap::fetch_stream_active(remote).await,
            )) {
                return;
            }
            send(Completion::RecordActive(
                bootstrap::fetch_record_active(remote).await,
            ));
        });
    }

    fn refresh_scenes(&self) {
        if let Some(remote) = self.live_session() {
            self.spawn_remote(remote, |r| async move {
                Completion::Scenes(bootstrap::fetch_scenes(&*r).await)
            });
        }
    }

    fn refresh_mixer(&self) {
        if let Some(remote) = self.live_session() {
            self.spawn_remote(remote, |r| async move {
                Completion::Mixer(bootstrap::fetch_mixer(&*r).await)
            });
        }
    }

    fn toggle_global_mute(&mut self) {
        let Some(remote) = self.live_session() else {
            debug!("not connected, ignoring global mute");
            return;
        };
        let known = self.cache.inputs().to_vec();
        self.pending.global_mute = true;
        self.spawn_remote(remote, move |r| async move {
            Completion::GlobalMute(mute::toggle_global_mute(&*r, &known).await)
        });
        self.render(Dirty {
            system: true,
            ..Dirty::NONE
        });
    }

    /// Fire and forget. The cache changes only when the matching event arrives.
    fn issue(&mut self, action: Action, request: Request) {
        let Some(remote) = self.live_session() else {
            debug!(action = %action.label(), "not connected, ignoring");
            return;
        };
        let mut dirty = Dirty::NONE;
        match &action {
            Action::ToggleStream => {
                self.pending.stream = true;
                dirty.system = true;
            }
            Action::ToggleRecord => {
                self.pending.record = true;
                dirty.system = true;
            }
            Action::SaveReplay => {
                self.pending.replay = ReplayIndicator::Pending;
                dirty.system = true;
            }
            Action::SetScene(name) => {
                self.pending.scene = Some(name.clone());
                dirty.scenes = true;
            }
            Action::ToggleInputMute(_) | Action::SetInputMuted(_) | Action::TriggerSound(_) => {}
        }
        self.spawn_remote(remote, move |r| async move {
            let result = r.call(request).await.map(|_| ());
            Completion::Command { action, result }
        });
        self.render(dirty);
    }

    fn spawn_remote<F, Fut>(&self, remote: Arc<dyn ObsRemote>, work: F)
    where
        F: FnOnce(Arc<dyn ObsRemote>) -> Fut + Send + 'static,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let epoch = remote.epoch();
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let completion = work(remote).await;
            let _ = tx.send(Signal::Completed { epoch, completion });
        });
    }

    fn live_session(&self) -> Option<Arc<dyn ObsRemote>> {
        self.session
            .as_ref()
            .filter(|s| self.connection.is_live(s.epoch()))
            .cloned()
    }

    fn move_scene(&mut self, from: usize, to: usize) -> Result<Vec<String>, ReorderError> {
        if self.layout_locked {
            return Err(ReorderError::LayoutLocked);
        }
        let rendered: Vec<String> = self.ordered_scenes().into_iter().map(|s| s.name).collect();
        let moved = reconcile::move_item(&rendered, from, to)?;
        let persisted = reconcile::write_back(&moved, &self.scene_order);
        self.prefs.set_scene_order(&persisted)?;
        self.scene_order = persisted;
        self.render(Dirty {
            scenes: true,
            ..Dirty::NONE
        });
        Ok(moved)
    }

    fn after_soundboard_change(&mut self, changed: bool) {
        if changed {
            self.render(Dirty {
                soundboard: true,
                ..Dirty::NONE
            });
        }
    }

    fn session_lost(&mut self, epoch: Epoch) {
        if !self
            .connection
            .on_session_lost(epoch, &self.signal_tx, Signal::RetryTick)
        {
            if self.connection.closed_before_connected(epoch) {
                debug!(%epoch, "session closed before its connect result arrived");
            } else {
                debug!(%epoch, "ignoring close of stale session");
            }
            return;
        }
        info!(%epoch, "session lost, retrying");
        let mut dirty = self.drop_session();
        dirty.status = true;
        self.render(dirty);
    }

    fn disconnect(&mut self) {
        let mut dirty = self.drop_session();
        self.connection.disconnect();
        info!("disconnected");
        dirty.status = true;
        self.render(dirty);
    }

    /// Closes the session if any and forgets what only a live session can vouch for.
    fn drop_session(&mut self) -> Dirty {
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.pending = Pending::default();
        self.cache.forget_activity();
        let mut dirty = self.sync_timer();
        dirty.system = true;
        dirty.scenes = true;
        dirty
    }

    fn sync_timer(&mut self) -> Dirty {
        if self.cache.activity().any() {
            self.timer
                .ensure_running(&self.signal_tx, Signal::ElapsedTick);
            Dirty::NONE
        } else if self.timer.stop() {
            Dirty {
                timer: true,
                ..Dirty::NONE
            }
        } else {
            Dirty::NONE
        }
    }

    fn ordered_scenes(&self) -> Vec<Scene> {
        reconcile::order_scenes(self.cache.scenes(), &self.scene_order)
    }

    pub fn view(&self) -> PanelView {
        let pending = SystemPending {
            stream: self.pending.stream,
            record: self.pending.record,
            global_mute: self.pending.global_mute,
            replay: self.pending.replay,
        };
        PanelView {
            connection: self.connection.state(),
            timer: self.timer.display(),
            system: reconcile::system_buttons(self.cache.activity(), self.cache.inputs(), &pending),
            scenes: reconcile::scene_buttons(&self.ordered_scenes(), self.pending.scene.as_deref()),
            mixer: reconcile::mixer_entries(self.cache.inputs()),
            soundboard: reconcile::sound_buttons(self.soundboard.entries()),
            layout_locked: self.layout_locked,
        }
    }

    fn render(&mut self, dirty: Dirty) {
        if !dirty.any() {
            return;
        }
        let view = self.view();
        self.sink.render(&view, dirty);
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.connection.disconnect();
        self.timer.stop();
        debug!("controller stopped");
    }
}
