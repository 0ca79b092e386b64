use scenedeck_protocol::{
    auth_response, op, ClientMessage, Event, MediaAction, Request, ServerMessage,
};
use serde_json::{json, Value};

#[test]
fn decodes_hello_with_challenge() {
    let text = json!({
        "op": 0,
        "d": {
            "obsWebSocketVersion": "5.4.2",
            "rpcVersion": 1,
            "authentication": { "challenge": "c+1", "salt": "s+1" }
        }
    })
    .to_string();

    match ServerMessage::decode(&text).expect("hello decodes") {
        ServerMessage::Hello(hello) => {
            assert_eq!(hello.rpc_version, 1);
            let auth = hello.authentication.expect("challenge present");
            assert_eq!(auth.challenge, "c+1");
            assert_eq!(auth.salt, "s+1");
        }
        other => panic!("expected hello, got {other:?}"),
    }
}

#[test]
fn request_carries_id_type_and_data() {
    let msg = ClientMessage::Request {
        request_id: "7".to_string(),
        request: Request::TriggerMediaInputAction {
            input_name: "Horn".to_string(),
            media_action: MediaAction::Restart,
        },
    };
    let v: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

    assert_eq!(v["op"], op::REQUEST);
    assert_eq!(v["d"]["requestId"], "7");
    assert_eq!(v["d"]["requestType"], "TriggerMediaInputAction");
    assert_eq!(v["d"]["requestData"]["inputName"], "Horn");
    assert_eq!(
        v["d"]["requestData"]["mediaAction"],
        "OBS_WEBSOCKET_MEDIA_INPUT_ACTION_RESTART"
    );
}

#[test]
fn unit_request_decodes_without_data() {
    let text = json!({
        "op": 6,
        "d": { "requestType": "GetSceneList", "requestId": "abc" }
    })
    .to_string();

    assert_eq!(
        ClientMessage::decode(&text).unwrap(),
        ClientMessage::Request {
            request_id: "abc".to_string(),
            request: Request::GetSceneList,
        }
    );
}

#[test]
fn unknown_event_type_is_other() {
    let text = json!({
        "op": 5,
        "d": { "eventType": "SceneTransitionStarted", "eventIntent": 16, "eventData": {} }
    })
    .to_string();

    assert_eq!(
        ServerMessage::decode(&text).unwrap(),
        ServerMessage::Event(Event::Other("SceneTransitionStarted".to_string()))
    );
}

#[test]
fn mute_event_decodes_camel_case_fields() {
    let text = json!({
        "op": 5,
        "d": {
            "eventType": "InputMuteStateChanged",
            "eventIntent": 8,
            "eventData": { "inputName": "Mic/Aux", "inputMuted": true }
        }
    })
    .to_string();

    assert_eq!(
        ServerMessage::decode(&text).unwrap(),
        ServerMessage::Event(Event::InputMuteStateChanged {
            input_name: "Mic/Aux".to_string(),
            input_muted: true,
        })
    );
}

#[test]
fn encoded_event_decodes_back() {
    let msg = ServerMessage::Event(Event::CurrentProgramSceneChanged {
        scene_name: "Live".to_string(),
    });
    let text = msg.encode().unwrap();
    assert_eq!(ServerMessage::decode(&text).unwrap(), msg);
}

#[test]
fn rejects_unexpected_op() {
    let err = ServerMessage::decode(r#"{"op":3,"d":{}}"#).unwrap_err();
    assert!(matches!(
        err,
        scenedeck_protocol::ProtocolError::UnexpectedOp(3)
    ));
}

#[test]
fn auth_depends_on_every_input() {
    let base = auth_response("secret", "salt", "challenge");
    assert_eq!(base, auth_response("secret", "salt", "challenge"));
    assert_ne!(base, auth_response("secreT", "salt", "challenge"));
    assert_ne!(base, auth_response("secret", "salT", "challenge"));
    assert_ne!(base, auth_response("secret", "salt", "challengE"));
    // sha256 digest, base64 with padding
    assert_eq!(base.len(), 44);
}
