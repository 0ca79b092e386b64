use crate::config::{ConnectionSettings, DeckConfig};
use crate::connection::Epoch;
use crate::error::{ConnectError, RequestError};
use crate::session::{Session, SessionSignals};
use async_trait::async_trait;
use scenedeck_protocol::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Request/response surface of one live session.
#[async_trait]
pub trait ObsRemote: Send + Sync {
    fn epoch(&self) -> Epoch;

    async fn call(&self, request: Request) -> Result<Option<Value>, RequestError>;

    fn close(&self);
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        settings: &ConnectionSettings,
        epoch: Epoch,
        signals: SessionSignals,
    ) -> Result<Arc<dyn ObsRemote>, ConnectError>;
}

pub struct WsConnector {
    config: DeckConfig,
}

impl WsConnector {
    pub fn new(config: DeckConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        settings: &ConnectionSettings,
        epoch: Epoch,
        signals: SessionSignals,
    ) -> Result<Arc<dyn ObsRemote>, ConnectError> {
        let session = Session::connect(settings, epoch, &self.config, signals).await?;
        Ok(Arc::new(session))
    }
}

pub async fn call_typed<T: DeserializeOwned>(
    remote: &dyn ObsRemote,
    request: Request,
) -> Result<T, RequestError> {
    let data = remote.call(request).await?.unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| RequestError::Decode(e.to_string()))
}
