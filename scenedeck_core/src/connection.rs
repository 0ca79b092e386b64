use crate::timer::TimerSlot;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Retrying,
}

impl ConnectionState {
    pub fn status_text(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "OFFLINE",
            ConnectionState::Connecting => "CONNECTING...",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Retrying => "RETRYING...",
        }
    }
}

/// Identity of one connect attempt and the session it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connection lifecycle plus the single fixed-rate retry timer.
pub struct ConnectionManager {
    state: ConnectionState,
    epoch: Epoch,
    retry: TimerSlot,
    wanted: bool,
    closed_early: Option<Epoch>,
}

impl ConnectionManager {
    pub fn new(retry_interval: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            epoch: Epoch::default(),
            retry: TimerSlot::new(retry_interval),
            wanted: false,
            closed_early: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn retry_armed(&self) -> bool {
        self.retry.is_armed()
    }

    pub fn retry_generation(&self) -> u64 {
        self.retry.generation()
    }

    /// Starts a fresh attempt; anything tagged with an older epoch becomes stale.
    pub fn begin_attempt(&mut self) -> Epoch {
        self.wanted = true;
        self.closed_early = None;
        self.epoch = Epoch(self.epoch.0 + 1);
        self.state = ConnectionState::Connecting;
        self.epoch
    }

    /// Refuses a session whose close was already seen.
    pub fn on_connected(&mut self, epoch: Epoch) -> bool {
        if epoch != self.epoch
            || self.state != ConnectionState::Connecting
            || self.closed_before_connected(epoch)
        {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.retry.cancel();
        true
    }

    pub fn on_connect_failed<T, F>(&mut self, epoch: Epoch, tx: &mpsc::UnboundedSender<T>, make: F) -> bool
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        if epoch != self.epoch || self.state != ConnectionState::Connecting {
            return false;
        }
        self.closed_early = None;
        self.state = ConnectionState::Retrying;
        self.retry.arm(tx, make);
        true
    }

    /// Unexpected end of the live session.
    pub fn on_session_lost<T, F>(&mut self, epoch: Epoch, tx: &mpsc::UnboundedSender<T>, make: F) -> bool
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        if epoch == self.epoch && self.state == ConnectionState::Connecting {
            // the connect result for this epoch is still in flight
            self.closed_early = Some(epoch);
            return false;
        }
        if epoch != self.epoch || self.state != ConnectionState::Connected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        if self.wanted {
            self.retry.arm(tx, make);
        }
        true
    }

    /// User-initiated; no retry follows.
    pub fn disconnect(&mut self) {
        self.wanted = false;
        self.closed_early = None;
        self.retry.cancel();
        self.epoch = Epoch(self.epoch.0 + 1);
        self.state = ConnectionState::Disconnected;
    }

    /// A retry tick should start an attempt only if it comes from the live timer
    /// and nothing is connected or connecting.
    pub fn accepts_retry(&self, generation: u64) -> bool {
        self.retry.accepts(generation)
            && matches!(
                self.state,
                ConnectionState::Disconnected | ConnectionState::Retrying
            )
    }

    /// The session of the pending attempt `epoch` closed before it was handed over.
    pub fn closed_before_connected(&self, epoch: Epoch) -> bool {
        self.closed_early == Some(epoch)
    }

    pub fn is_live(&self, epoch: Epoch) -> bool {
        self.state == ConnectionState::Connected && epoch == self.epoch
    }
}
