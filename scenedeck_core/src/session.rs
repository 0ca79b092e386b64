use crate::config::{ConnectionSettings, DeckConfig};
use crate::connection::Epoch;
use crate::error::{ConnectError, RequestError};
use crate::remote::ObsRemote;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use scenedeck_protocol::{
    auth_response, ClientMessage, Event, Identify, Request, RequestResponse, ServerMessage,
    AUTH_FAILED_CLOSE_CODE, RPC_VERSION,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ReplySlot = oneshot::Sender<Result<Option<Value>, RequestError>>;

pub type SessionSignals = mpsc::UnboundedSender<SessionSignal>;

/// Server push for one session, stamped with the session's epoch.
#[derive(Debug, Clone)]
pub enum SessionSignal {
    Event { epoch: Epoch, event: Event },
    Closed { epoch: Epoch },
}

enum Outgoing {
    Call {
        request_id: String,
        request: Request,
        reply: ReplySlot,
    },
    /// The caller gave up waiting.
    Forget(String),
    Close,
}

/// An identified connection. The socket is owned by a background I/O task;
/// dropping the last handle closes it.
pub struct Session {
    epoch: Epoch,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    next_id: AtomicU64,
    in_flight: Arc<AtomicUsize>,
    request_timeout: Duration,
}

impl Session {
    pub async fn connect(
        settings: &ConnectionSettings,
        epoch: Epoch,
        config: &DeckConfig,
        signals: SessionSignals,
    ) -> Result<Session, ConnectError> {
        let url = settings.endpoint()?;
        let handshake = async {
            let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
            identify(&mut ws, settings, config.event_subscriptions).await?;
            Ok::<_, ConnectError>(ws)
        };
        let ws = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| ConnectError::Timeout)??;

        let (outgoing, rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_io(ws, rx, epoch, signals, in_flight.clone()));

        Ok(Session {
            epoch,
            outgoing,
            next_id: AtomicU64::new(1),
            in_flight,
            request_timeout: config.request_timeout,
        })
    }

    /// Requests sent and still waiting for their response.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObsRemote for Session {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    async fn call(&self, request: Request) -> Result<Option<Value>, RequestError> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let (reply, rx) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Call {
                request_id: request_id.clone(),
                request,
                reply,
            })
            .map_err(|_| RequestError::SessionClosed)?;

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RequestError::SessionClosed),
            Err(_) => {
                let _ = self.outgoing.send(Outgoing::Forget(request_id));
                Err(RequestError::Timeout)
            }
        }
    }

    fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn identify(
    ws: &mut WsStream,
    settings: &ConnectionSettings,
    event_subscriptions: u32,
) -> Result<(), ConnectError> {
    let hello = match next_handshake_message(ws).await? {
        ServerMessage::Hello(hello) => hello,
        other => return Err(ConnectError::Handshake(format!("expected Hello, got {other:?}"))),
    };

    let authentication = match (&hello.authentication, settings.password()) {
        (Some(challenge), Some(password)) => Some(auth_response(
            password,
            &challenge.salt,
            &challenge.challenge,
        )),
        (Some(_), None) => return Err(ConnectError::AuthRejected),
        (None, _) => None,
    };

    let identify = ClientMessage::Identify(Identify {
        rpc_version: RPC_VERSION,
        authentication,
        event_subscriptions,
    });
    ws.send(Message::Text(identify.encode()?.into())).await?;

    match next_handshake_message(ws).await? {
        ServerMessage::Identified(_) => Ok(()),
        other => Err(ConnectError::Handshake(format!(
            "expected Identified, got {other:?}"
        ))),
    }
}

async fn next_handshake_message(ws: &mut WsStream) -> Result<ServerMessage, ConnectError> {
    while let Some(frame) = ws.next().await {
        match frame? {
            Message::Text(text) => return Ok(ServerMessage::decode(&text)?),
            Message::Close(Some(frame)) if u16::from(frame.code) == AUTH_FAILED_CLOSE_CODE => {
                return Err(ConnectError::AuthRejected)
            }
            Message::Close(frame) => {
                return Err(ConnectError::Handshake(format!(
                    "closed during handshake: {frame:?}"
                )))
            }
            _ => continue,
        }
    }
    Err(ConnectError::Handshake(
        "connection ended during handshake".to_string(),
    ))
}

async fn run_io(
    ws: WsStream,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    epoch: Epoch,
    signals: SessionSignals,
    in_flight: Arc<AtomicUsize>,
) {
    let (mut write, mut read) = ws.split();
    let mut pending: HashMap<String, ReplySlot> = HashMap::new();

    loop {
        tokio::select! {
            next = outgoing.recv() => {
                match next {
                    Some(Outgoing::Call { request_id, request, reply }) => {
                        let msg = ClientMessage::Request { request_id: request_id.clone(), request };
                        let payload = match msg.encode() {
                            Ok(p) => p,
                            Err(e) => {
                                let _ = reply.send(Err(RequestError::Decode(e.to_string())));
                                continue;
                            }
                        };
                        if write.send(Message::Text(payload.into())).await.is_err() {
                            let _ = reply.send(Err(RequestError::SessionClosed));
                            break;
                        }
                        pending.insert(request_id, reply);
                    }
                    Some(Outgoing::Forget(request_id)) => {
                        if pending.remove(&request_id).is_some() {
                            debug!(%epoch, %request_id, "dropped timed out request");
                        }
                    }
                    Some(Outgoing::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ServerMessage::decode(&text) {
                        Ok(ServerMessage::RequestResponse(resp)) => {
                            match pending.remove(&resp.request_id) {
                                Some(reply) => { let _ = reply.send(into_result(resp)); }
                                None => debug!(%epoch, request_id = %resp.request_id, "response for unknown request"),
                            }
                        }
                        Ok(ServerMessage::Event(event)) => {
                            let _ = signals.send(SessionSignal::Event { epoch, event });
                        }
                        Ok(other) => debug!(%epoch, ?other, "ignoring unexpected message"),
                        Err(e) => warn!(%epoch, error = %e, "undecodable frame"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        debug!(%epoch, ?frame, "closed by endpoint");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%epoch, error = %e, "session read failed");
                        break;
                    }
                    None => break,
                }
            }
        }
        in_flight.store(pending.len(), Ordering::Relaxed);
    }

    in_flight.store(0, Ordering::Relaxed);
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(RequestError::SessionClosed));
    }
    let _ = signals.send(SessionSignal::Closed { epoch });
}

fn into_result(resp: RequestResponse) -> Result<Option<Value>, RequestError> {
    if resp.request_status.result {
        return Ok(resp.response_data);
    }
    Err(RequestError::Failed {
        request_type: resp.request_type,
        code: resp.request_status.code,
        comment: resp.request_status.comment.unwrap_or_default(),
    })
}
