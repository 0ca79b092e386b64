//! Connection settings and runtime tunables.

use crate::error::ConnectError;
use scenedeck_protocol::{subscriptions, DEFAULT_PORT};
use std::fmt;
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

/// Where to reach the control endpoint. Host, port and password are opaque strings.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: String,
    pub password: Zeroizing<String>,
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>, port: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// `ws://{host}:{port}`, with the default port when none is set.
    pub fn endpoint(&self) -> Result<Url, ConnectError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConnectError::MissingHost);
        }
        let port = match self.port.trim() {
            "" => DEFAULT_PORT,
            p => p,
        };
        Ok(Url::parse(&format!("ws://{host}:{port}"))?)
    }

    pub fn password(&self) -> Option<&str> {
        Some(self.password.as_str()).filter(|p| !p.is_empty())
    }
}

impl PartialEq for ConnectionSettings {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.password.as_str() == other.password.as_str()
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub retry_interval: Duration,
    pub tick_interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub event_subscriptions: u32,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            event_subscriptions: subscriptions::ALL,
        }
    }
}
