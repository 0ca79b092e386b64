use scenedeck_protocol::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("host is empty")]
    MissingHost,
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("endpoint unreachable: {0}")]
    Unreachable(Box<tungstenite::Error>),
    #[error("authentication rejected")]
    AuthRejected,
    #[error("timed out waiting for the endpoint")]
    Timeout,
    #[error("connection closed before it was ready")]
    ClosedEarly,
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<tungstenite::Error> for ConnectError {
    fn from(e: tungstenite::Error) -> Self {
        ConnectError::Unreachable(Box::new(e))
    }
}

/// Failure of a single remote call. Never fatal to the session.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error("{request_type} failed with code {code}: {comment}")]
    Failed {
        request_type: String,
        code: u32,
        comment: String,
    },
    #[error("session closed")]
    SessionClosed,
    #[error("request timed out")]
    Timeout,
    #[error("invalid response data: {0}")]
    Decode(String),
}
