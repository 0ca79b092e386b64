use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// At most one live periodic timer. Each arming gets a new generation so ticks
/// queued before a cancel can be recognised and dropped by the receiver.
pub struct TimerSlot {
    period: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            handle: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` when a timer is already armed; the existing one keeps running.
    pub fn arm<T, F>(&mut self, tx: &mpsc::UnboundedSender<T>, make: F) -> bool
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        if self.handle.is_some() {
            return false;
        }
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(make(generation)).is_err() {
                    break;
                }
            }
        }));
        true
    }

    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn accepts(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Elapsed stream/record time, counted in whole seconds.
pub struct ElapsedTimer {
    slot: TimerSlot,
    seconds: u64,
}

impl ElapsedTimer {
    pub fn new(tick: Duration) -> Self {
        Self {
            slot: TimerSlot::new(tick),
            seconds: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_armed()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn display(&self) -> String {
        format_hms(self.seconds)
    }

    /// Starting an already running timer is a no-op.
    pub fn ensure_running<T, F>(&mut self, tx: &mpsc::UnboundedSender<T>, make: F) -> bool
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        self.slot.arm(tx, make)
    }

    /// Cancels the tick and resets to zero. Returns whether the display changed.
    pub fn stop(&mut self) -> bool {
        let was_running = self.slot.cancel();
        let changed = was_running || self.seconds != 0;
        self.seconds = 0;
        changed
    }

    pub fn tick(&mut self, generation: u64) -> bool {
        if !self.slot.accepts(generation) {
            return false;
        }
        self.seconds += 1;
        true
    }
}

/// `HH:MM:SS`; hours keep counting past 24.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
