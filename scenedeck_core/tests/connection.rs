use scenedeck_core::connection::{ConnectionManager, ConnectionState};
use std::time::Duration;
use tokio::sync::mpsc;

const RETRY: Duration = Duration::from_secs(5);

fn connected(manager: &mut ConnectionManager) -> scenedeck_core::Epoch {
    let epoch = manager.begin_attempt();
    assert!(manager.on_connected(epoch));
    epoch
}

#[tokio::test(start_paused = true)]
async fn double_disconnect_signal_arms_exactly_one_retry() {
    let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
    let mut manager = ConnectionManager::new(RETRY);
    let epoch = connected(&mut manager);

    assert!(manager.on_session_lost(epoch, &tx, |g| g));
    assert!(!manager.on_session_lost(epoch, &tx, |g| g));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.retry_armed());
    assert_eq!(manager.retry_generation(), 1);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let mut ticks = Vec::new();
    while let Ok(g) = rx.try_recv() {
        ticks.push(g);
    }
    assert_eq!(ticks, [1, 1]);
    assert!(manager.accepts_retry(1));
}

#[tokio::test(start_paused = true)]
async fn repeated_connect_failures_share_one_timer() {
    let (tx, _rx) = mpsc::unbounded_channel::<u64>();
    let mut manager = ConnectionManager::new(RETRY);

    let first = manager.begin_attempt();
    assert!(manager.on_connect_failed(first, &tx, |g| g));
    assert_eq!(manager.state(), ConnectionState::Retrying);
    assert!(manager.accepts_retry(1));

    let second = manager.begin_attempt();
    assert_eq!(manager.state(), ConnectionState::Connecting);
    // a tick while an attempt is in flight starts nothing
    assert!(!manager.accepts_retry(1));
    assert!(manager.on_connect_failed(second, &tx, |g| g));
    assert_eq!(manager.retry_generation(), 1);

    let third = manager.begin_attempt();
    assert!(manager.on_connected(third));
    assert!(!manager.retry_armed());
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn user_disconnect_arms_no_retry_and_outdates_the_session() {
    let (tx, _rx) = mpsc::unbounded_channel::<u64>();
    let mut manager = ConnectionManager::new(RETRY);
    let epoch = connected(&mut manager);

    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.is_live(epoch));
    assert!(!manager.on_session_lost(epoch, &tx, |g| g));
    assert!(!manager.retry_armed());
}

#[tokio::test(start_paused = true)]
async fn results_of_superseded_attempts_are_rejected() {
    let (tx, _rx) = mpsc::unbounded_channel::<u64>();
    let mut manager = ConnectionManager::new(RETRY);
    let old = manager.begin_attempt();
    let new = manager.begin_attempt();
    assert!(new > old);

    assert!(!manager.on_connected(old));
    assert!(!manager.on_connect_failed(old, &tx, |g| g));
    assert_eq!(manager.state(), ConnectionState::Connecting);
    assert!(manager.on_connected(new));
    assert!(manager.is_live(new));
    assert!(!manager.is_live(old));
}

#[tokio::test(start_paused = true)]
async fn close_seen_before_connect_result_refuses_the_session() {
    let (tx, _rx) = mpsc::unbounded_channel::<u64>();
    let mut manager = ConnectionManager::new(RETRY);
    let epoch = manager.begin_attempt();

    assert!(!manager.on_session_lost(epoch, &tx, |g| g));
    assert!(manager.closed_before_connected(epoch));
    assert!(!manager.on_connected(epoch));
    assert_eq!(manager.state(), ConnectionState::Connecting);

    assert!(manager.on_connect_failed(epoch, &tx, |g| g));
    assert_eq!(manager.state(), ConnectionState::Retrying);
    assert!(manager.retry_armed());
    assert!(!manager.closed_before_connected(epoch));

    let next = manager.begin_attempt();
    assert!(manager.on_connected(next));
}

#[test]
fn status_text_per_state() {
    assert_eq!(ConnectionState::Connected.status_text(), "CONNECTED");
    assert_eq!(ConnectionState::Connecting.status_text(), "CONNECTING...");
    assert_eq!(ConnectionState::Retrying.status_text(), "RETRYING...");
    assert_eq!(ConnectionState::Disconnected.status_text(), "OFFLINE");
}
