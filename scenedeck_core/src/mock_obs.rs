//! An in-process control endpoint speaking the real wire protocol over a
//! local socket. Used by the integration tests and the `mock_obs` binary.

use crate::config::ConnectionSettings;
use futures_util::{SinkExt, StreamExt};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use scenedeck_protocol::{
    auth_response, AuthChallenge, ClientMessage, Event, Hello, Identified, InputItem,
    InputListResponse, Request, RequestResponse, RequestStatus, SceneItem, SceneListResponse,
    ServerMessage, AUTH_FAILED_CLOSE_CODE, RPC_VERSION,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, warn};

const UNKNOWN_REQUEST_TYPE: u32 = 204;
const OUTPUT_NOT_RUNNING: u32 = 501;
const RESOURCE_NOT_FOUND: u32 = 600;
const INVALID_INPUT_KIND: u32 = 604;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInput {
    pub name: String,
    pub kind: String,
    pub muted: bool,
    /// `false` for inputs that claim an audio kind but reject mute calls.
    pub mutable: bool,
}

impl MockInput {
    pub fn new(name: &str, kind: &str, muted: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            muted,
            mutable: true,
        }
    }

    pub fn unmutable(mut self) -> Self {
        self.mutable = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockState {
    pub password: Option<String>,
    pub scenes: Vec<String>,
    pub current_scene: Option<String>,
    pub inputs: Vec<MockInput>,
    pub streaming: bool,
    pub recording: bool,
    pub replay_buffer_active: bool,
}

impl MockState {
    pub fn sample() -> Self {
        Self {
            password: None,
            scenes: vec![
                "Starting Soon".to_string(),
                "Live".to_string(),
                "BRB".to_string(),
            ],
            current_scene: Some("Starting Soon".to_string()),
            inputs: vec![
                MockInput::new("Mic/Aux", "pulse_input_capture", false),
                MockInput::new("Desktop Audio", "pulse_output_capture", false),
                MockInput::new("Horn", "ffmpeg_source", false),
                MockInput::new("Camera", "v4l2_input", false),
            ],
            streaming: false,
            recording: false,
            replay_buffer_active: true,
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    fn input_mut(&mut self, name: &str) -> Result<&mut MockInput, RequestStatus> {
        self.inputs
            .iter_mut()
            .find(|i| i.name == name)
            .ok_or_else(|| RequestStatus::failure(RESOURCE_NOT_FOUND, "No source was found."))
    }

    fn mutable_input(&mut self, name: &str) -> Result<&mut MockInput, RequestStatus> {
        let input = self.input_mut(name)?;
        if !input.mutable {
            return Err(RequestStatus::failure(
                INVALID_INPUT_KIND,
                "The specified input does not support audio.",
            ));
        }
        Ok(input)
    }
}

struct Shared {
    state: Mutex<MockState>,
    requests: Mutex<Vec<Request>>,
    events: broadcast::Sender<Event>,
    kick: broadcast::Sender<()>,
    accepting: AtomicBool,
    replying: AtomicBool,
    identified: AtomicUsize,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, request: &Request) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
    }

    /// Applies one request; returns the status, response data and the events it caused.
    fn handle(&self, request: &Request) -> (RequestStatus, Option<Value>, Vec<Event>) {
        let mut state = self.state();
        let mut events = Vec::new();
        let result: Result<Option<Value>, RequestStatus> = match request {
            Request::GetSceneList => {
                let resp = SceneListResponse {
                    current_program_scene_name: state.current_scene.clone(),
                    current_preview_scene_name: None,
                    scenes: state
                        .scenes
                        .iter()
                        .enumerate()
                        .map(|(i, name)| SceneItem {
                            scene_name: name.clone(),
                            scene_index: i as i64,
                        })
                        .collect(),
                };
                serde_json::to_value(resp).map(Some).map_err(internal)
            }
            Request::SetCurrentProgramScene { scene_name } => {
                if state.scenes.contains(scene_name) {
                    if state.current_scene.as_deref() != Some(scene_name.as_str()) {
                        state.current_scene = Some(scene_name.clone());
                        events.push(Event::CurrentProgramSceneChanged {
                            scene_name: scene_name.clone(),
                        });
                    }
                    Ok(None)
                } else {
                    Err(RequestStatus::failure(RESOURCE_NOT_FOUND, "No scene was found."))
                }
            }
            Request::GetInputList => {
                let resp = InputListResponse {
                    inputs: state
                        .inputs
                        .iter()
                        .map(|i| InputItem {
                            input_name: i.name.clone(),
                            input_kind: i.kind.clone(),
                            unversioned_input_kind: Some(i.kind.clone()),
                        })
                        .collect(),
                };
                serde_json::to_value(resp).map(Some).map_err(internal)
            }
            Request::GetInputMute { input_name } => state
                .mutable_input(input_name)
                .map(|i| Some(json!({ "inputMuted": i.muted }))),
            Request::SetInputMute {
                input_name,
                input_muted,
            } => state.mutable_input(input_name).map(|i| {
                if i.muted != *input_muted {
                    i.muted = *input_muted;
                    events.push(mute_event(i));
                }
                None
            }),
            Request::ToggleInputMute { input_name } => state.mutable_input(input_name).map(|i| {
                i.muted = !i.muted;
                events.push(mute_event(i));
                Some(json!({ "inputMuted": i.muted }))
            }),
            Request::ToggleStream => {
                state.streaming = !state.streaming;
                events.push(Event::StreamStateChanged {
                    output_active: state.streaming,
                    output_state: output_state(state.streaming),
                });
                Ok(Some(json!({ "outputActive": state.streaming })))
            }
            Request::ToggleRecord => {
                state.recording = !state.recording;
                events.push(Event::RecordStateChanged {
                    output_active: state.recording,
                    output_state: output_state(state.recording),
                });
                Ok(Some(json!({ "outputActive": state.recording })))
            }
            Request::SaveReplayBuffer => {
                if state.replay_buffer_active {
                    Ok(None)
                } else {
                    Err(RequestStatus::failure(
                        OUTPUT_NOT_RUNNING,
                        "Replay buffer is not active.",
                    ))
                }
            }
            Request::TriggerMediaInputAction { input_name, .. } => {
                state.input_mut(input_name).map(|_| None)
            }
            Request::GetStreamStatus => Ok(Some(json!({ "outputActive": state.streaming }))),
            Request::GetRecordStatus => Ok(Some(json!({ "outputActive": state.recording }))),
        };

        match result {
            Ok(data) => (RequestStatus::success(), data, events),
            Err(status) => (status, None, Vec::new()),
        }
    }
}

fn internal(e: serde_json::Error) -> RequestStatus {
    RequestStatus::failure(0, e.to_string())
}

fn mute_event(input: &MockInput) -> Event {
    Event::InputMuteStateChanged {
        input_name: input.name.clone(),
        input_muted: input.muted,
    }
}

fn output_state(active: bool) -> String {
    if active {
        "OBS_WEBSOCKET_OUTPUT_STARTED".to_string()
    } else {
        "OBS_WEBSOCKET_OUTPUT_STOPPED".to_string()
    }
}

fn random_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub struct MockObs {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockObs {
    pub async fn start(state: MockState) -> std::io::Result<MockObs> {
        Self::start_on("127.0.0.1:0", state).await
    }

    pub async fn start_on(addr: &str, state: MockState) -> std::io::Result<MockObs> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (events, _) = broadcast::channel(64);
        let (kick, _) = broadcast::channel(4);
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            requests: Mutex::new(Vec::new()),
            events,
            kick,
            accepting: AtomicBool::new(true),
            replying: AtomicBool::new(true),
            identified: AtomicUsize::new(0),
        });
        let task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));
        Ok(MockObs { addr, shared, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Settings a client needs to reach this endpoint.
    pub fn settings(&self) -> ConnectionSettings {
        let password = self.shared.state().password.clone().unwrap_or_default();
        ConnectionSettings::new(
            self.addr.ip().to_string(),
            self.addr.port().to_string(),
            password,
        )
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.shared.state())
    }

    pub fn push_event(&self, event: Event) {
        let _ = self.shared.events.send(event);
    }

    /// Drops every open connection without a close handshake.
    pub fn kick_clients(&self) {
        let _ = self.shared.kick.send(());
    }

    /// While off, new sockets are dropped right after accept.
    pub fn set_accepting(&self, accepting: bool) {
        self.shared.accepting.store(accepting, Ordering::Relaxed);
    }

    /// While off, requests are still applied but their responses are swallowed.
    pub fn set_replying(&self, replying: bool) {
        self.shared.replying.store(replying, Ordering::Relaxed);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self, request_type: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.request_type() == request_type)
            .count()
    }

    /// How many clients have completed the handshake so far.
    pub fn identified_count(&self) -> usize {
        self.shared.identified.load(Ordering::Relaxed)
    }
}

impl Drop for MockObs {
    fn drop(&mut self) {
        self.task.abort();
        let _ = self.shared.kick.send(());
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "mock accept failed");
                continue;
            }
        };
        if !shared.accepting.load(Ordering::Relaxed) {
            debug!(%peer, "mock refusing connection");
            drop(stream);
            continue;
        }
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(e) = serve(stream, shared).await {
                debug!(%peer, error = %e, "mock connection ended");
            }
        });
    }
}

async fn send(ws: &mut WebSocketStream<TcpStream>, msg: &ServerMessage) -> Result<(), tungstenite::Error> {
    let payload = msg
        .encode()
        .map_err(|e| tungstenite::Error::Io(std::io::Error::other(e.to_string())))?;
    ws.send(Message::Text(payload.into())).await
}

async fn serve(stream: TcpStream, shared: Arc<Shared>) -> Result<(), tungstenite::Error> {
    // subscribe before the handshake so no event is missed once identified
    let mut events = shared.events.subscribe();
    let mut kick = shared.kick.subscribe();
    let mut ws = tokio_tungstenite::accept_async(stream).await?;

    let password = shared.state().password.clone();
    let challenge = password.as_ref().map(|_| AuthChallenge {
        challenge: random_token(),
        salt: random_token(),
    });
    let hello = ServerMessage::Hello(Hello {
        obs_web_socket_version: "5.5.0".to_string(),
        rpc_version: RPC_VERSION,
        authentication: challenge.clone(),
    });
    send(&mut ws, &hello).await?;

    let identify = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => match ClientMessage::decode(&text) {
                Ok(ClientMessage::Identify(identify)) => break identify,
                _ => continue,
            },
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e),
            None => return Ok(()),
        }
    };

    if let (Some(password), Some(challenge)) = (&password, &challenge) {
        let expected = auth_response(password, &challenge.salt, &challenge.challenge);
        if identify.authentication.as_deref() != Some(expected.as_str()) {
            let frame = CloseFrame {
                code: CloseCode::from(AUTH_FAILED_CLOSE_CODE),
                reason: "Authentication failed.".into(),
            };
            let _ = ws.close(Some(frame)).await;
            return Ok(());
        }
    }

    send(
        &mut ws,
        &ServerMessage::Identified(Identified {
            negotiated_rpc_version: RPC_VERSION,
        }),
    )
    .await?;
    shared.identified.fetch_add(1, Ordering::Relaxed);

    loop {
        tokio::select! {
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let response = respond(&shared, &text);
                    if shared.replying.load(Ordering::Relaxed) {
                        send(&mut ws, &ServerMessage::RequestResponse(response)).await?;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
            },
            event = events.recv() => match event {
                Ok(event) => send(&mut ws, &ServerMessage::Event(event)).await?,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
            _ = kick.recv() => return Ok(()),
        }
    }
}

fn respond(shared: &Shared, text: &str) -> RequestResponse {
    match ClientMessage::decode(text) {
        Ok(ClientMessage::Request {
            request_id,
            request,
        }) => {
            shared.record(&request);
            let (request_status, response_data, events) = shared.handle(&request);
            for event in events {
                let _ = shared.events.send(event);
            }
            RequestResponse {
                request_type: request.request_type().to_string(),
                request_id,
                request_status,
                response_data,
            }
        }
        _ => {
            let raw: Value = serde_json::from_str(text).unwrap_or(Value::Null);
            let field = |name: &str| {
                raw["d"][name]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_default()
            };
            RequestResponse {
                request_type: field("requestType"),
                request_id: field("requestId"),
                request_status: RequestStatus::failure(
                    UNKNOWN_REQUEST_TYPE,
                    "Your request type is not valid.",
                ),
                response_data: None,
            }
        }
    }
}
