use scenedeck_core::bootstrap::{
    fetch_mixer, fetch_record_active, fetch_scenes, fetch_stream_active,
};
use scenedeck_core::mock_obs::{MockInput, MockObs, MockState};
use scenedeck_core::remote::call_typed;
use scenedeck_core::{
    AudioKind, ConnectError, ConnectionSettings, DeckConfig, Epoch, ObsRemote, RequestError,
    Session, SessionSignal,
};
use scenedeck_protocol::{Event, Request, SceneListResponse};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

fn config() -> DeckConfig {
    DeckConfig {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        ..DeckConfig::default()
    }
}

async fn open(
    settings: &ConnectionSettings,
    epoch: u64,
) -> (
    Result<Session, ConnectError>,
    mpsc::UnboundedReceiver<SessionSignal>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::connect(settings, Epoch(epoch), &config(), tx).await;
    (session, rx)
}

async fn next_signal(rx: &mut mpsc::UnboundedReceiver<SessionSignal>) -> SessionSignal {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("signal in time")
        .expect("signal channel open")
}

#[tokio::test]
async fn identifies_without_password() {
    let mock = MockObs::start(MockState::sample()).await.unwrap();
    let (session, _rx) = open(&mock.settings(), 1).await;
    let session = session.expect("connects");

    let scenes: SceneListResponse = call_typed(&session, Request::GetSceneList).await.unwrap();
    assert_eq!(scenes.scenes.len(), 3);
    assert_eq!(scenes.current_program_scene_name.as_deref(), Some("Starting Soon"));
    assert_eq!(mock.identified_count(), 1);
}

#[tokio::test]
async fn identifies_with_matching_password() {
    let mock = MockObs::start(MockState::sample().with_password("hunter2"))
        .await
        .unwrap();
    let (session, _rx) = open(&mock.settings(), 1).await;
    assert!(session.is_ok());
}

#[tokio::test]
async fn wrong_password_is_auth_rejected() {
    let mock = MockObs::start(MockState::sample().with_password("hunter2"))
        .await
        .unwrap();
    let settings = ConnectionSettings::new(
        mock.addr().ip().to_string(),
        mock.addr().port().to_string(),
        "hunter3",
    );

    let (session, _rx) = open(&settings, 1).await;
    assert!(matches!(session, Err(ConnectError::AuthRejected)));
    assert_eq!(mock.identified_count(), 0);
}

#[tokio::test]
async fn challenge_without_password_is_auth_rejected() {
    let mock = MockObs::start(MockState::sample().with_password("hunter2"))
        .await
        .unwrap();
    let settings = ConnectionSettings::new(
        mock.addr().ip().to_string(),
        mock.addr().port().to_string(),
        "",
    );
    let (session, _rx) = open(&settings, 1).await;
    assert!(matches!(session, Err(ConnectError::AuthRejected)));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let settings = ConnectionSettings::new("127.0.0.1", port.to_string(), "");
    let (session, _rx) = open(&settings, 1).await;
    assert!(matches!(session, Err(ConnectError::Unreachable(_))));
}

#[tokio::test]
async fn empty_host_is_rejected_before_dialing() {
    let settings = ConnectionSettings::new(" ", "4455", "");
    let (session, _rx) = open(&settings, 1).await;
    assert!(matches!(session, Err(ConnectError::MissingHost)));
}

#[tokio::test]
async fn failed_request_carries_status_code() {
    let mock = MockObs::start(MockState::sample()).await.unwrap();
    let (session, _rx) = open(&mock.settings(), 1).await;
    let session = session.unwrap();

    let err = session
        .call(Request::SetCurrentProgramScene {
            scene_name: "Nope".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        RequestError::Failed {
            request_type, code, ..
        } => {
            assert_eq!(request_type, "SetCurrentProgramScene");
            assert_eq!(code, 600);
        }
        other => panic!("expected failure status, got {other:?}"),
    }
}

#[tokio::test]
async fn events_are_forwarded_with_the_session_epoch() {
    let mock = MockObs::start(MockState::sample()).await.unwrap();
    let (session, mut rx) = open(&mock.settings(), 7).await;
    let session = session.unwrap();

    session.call(Request::ToggleStream).await.unwrap();
    match next_signal(&mut rx).await {
        SessionSignal::Event { epoch, event } => {
            assert_eq!(epoch, Epoch(7));
            assert!(matches!(
                event,
                Event::StreamStateChanged {
                    output_active: true,
                    ..
                }
            ));
        }
        other => panic!("expected event, got {other:?}"),
    }

    mock.push_event(Event::ExitStarted);
    assert!(matches!(
        next_signal(&mut rx).await,
        SessionSignal::Event {
            event: Event::ExitStarted,
            ..
        }
    ));
}

#[tokio::test]
async fn dropped_socket_signals_closed_and_fails_later_calls() {
    let mock = MockObs::start(MockState::sample()).await.unwrap();
    let (session, mut rx) = open(&mock.settings(), 3).await;
    let session = session.unwrap();

    mock.kick_clients();
    assert!(matches!(
        next_signal(&mut rx).await,
        SessionSignal::Closed { epoch: Epoch(3) }
    ));
    let err = session.call(Request::GetStreamStatus).await.unwrap_err();
    assert!(matches!(err, RequestError::SessionClosed));
}

#[tokio::test]
async fn bootstrap_fetches_recognized_audio_only() {
    let mut state = MockState::sample();
    state.inputs.push(MockInput::new("Phantom", "pulse_input_capture", false).unmutable());
    state.inputs.push(MockInput::new("Win Mic", "wasapi_input_capture", true));
    state.recording = true;
    let mock = MockObs::start(state).await.unwrap();
    let (session, _rx) = open(&mock.settings(), 1).await;
    let session = session.unwrap();

    let scenes = fetch_scenes(&session).await.unwrap();
    assert_eq!(scenes.names, ["Starting Soon", "Live", "BRB"]);

    let mixer = fetch_mixer(&session).await.unwrap();
    let names: Vec<_> = mixer.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Mic/Aux", "Desktop Audio", "Horn", "Win Mic"]);
    assert_eq!(mixer[3].kind, AudioKind::WasapiInputCapture);
    assert!(mixer[3].is_muted);

    let probed: Vec<_> = mock
        .requests()
        .into_iter()
        .filter_map(|r| match r {
            Request::GetInputMute { input_name } => Some(input_name),
            _ => None,
        })
        .collect();
    assert!(!probed.iter().any(|n| n == "Camera"));
    assert!(probed.iter().any(|n| n == "Phantom"));

    assert!(!fetch_stream_active(&session).await.unwrap());
    assert!(fetch_record_active(&session).await.unwrap());
}

#[tokio::test]
async fn timed_out_request_is_forgotten_by_the_session() {
    let mock = MockObs::start(MockState::sample()).await.unwrap();
    let config = DeckConfig {
        request_timeout: Duration::from_millis(200),
        ..config()
    };
    let (tx, _rx) = mpsc::unbounded_channel();
    let session = Session::connect(&mock.settings(), Epoch(1), &config, tx)
        .await
        .expect("connects");

    mock.set_replying(false);
    let err = session.call(Request::GetStreamStatus).await.unwrap_err();
    assert!(matches!(err, RequestError::Timeout), "{err:?}");

    let deadline = Instant::now() + WAIT;
    while session.in_flight() != 0 {
        assert!(Instant::now() < deadline, "timed out request still in flight");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    mock.set_replying(true);
    assert!(session.call(Request::GetStreamStatus).await.is_ok());
}
