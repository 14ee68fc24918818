//! Session worker tests on a paused clock.

use crossmark_board::Seat;
use crossmark_server::{
    ConnectionId, EndReason, Outbound, Outcome, ServerEvent, SessionConfig, SessionHandle,
    TimerMode,
};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{self, Instant};

type Inbox = UnboundedReceiver<Outbound>;

fn join(handle: &SessionHandle) -> (ConnectionId, Inbox) {
    let conn = handle.next_connection_id();
    let (outbox, inbox) = mpsc::unbounded_channel();
    handle.connect(conn, outbox).unwrap();
    (conn, inbox)
}

/// Skips frames until one matches.
async fn expect_event(inbox: &mut Inbox, matches: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        match inbox.recv().await {
            Some(Outbound::Event(event)) if matches(&event) => return event,
            Some(_) => continue,
            None => panic!("Outbox closed before the expected event"),
        }
    }
}

fn is_start(event: &ServerEvent) -> bool {
    matches!(event, ServerEvent::Start { .. })
}

fn is_game_over(event: &ServerEvent) -> bool {
    matches!(event, ServerEvent::GameOver { .. })
}

#[tokio::test(start_paused = true)]
async fn test_connection_ids_are_unique() {
    let (handle, _worker) = SessionHandle::spawn(SessionConfig::default());
    let first = handle.next_connection_id();
    let second = handle.clone().next_connection_id();
    assert_ne!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_turn_deadline_fires_without_traffic() {
    let (handle, _worker) = SessionHandle::spawn(SessionConfig::default());
    let (_x, mut x_inbox) = join(&handle);
    let (_o, mut o_inbox) = join(&handle);

    expect_event(&mut x_inbox, is_start).await;
    let t0 = Instant::now();

    let event = expect_event(&mut o_inbox, is_game_over).await;

    assert!(Instant::now() - t0 >= Duration::from_secs(30));
    match event {
        ServerEvent::GameOver { winner, reason, .. } => {
            assert_eq!(winner, Outcome::Winner(Seat::O));
            assert_eq!(reason, EndReason::Timeout);
        }
        other => panic!("Expected game over, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_reactive_mode_waits_for_next_frame() {
    let config = SessionConfig::default().with_timer_mode(TimerMode::Reactive);
    let (handle, _worker) = SessionHandle::spawn(config);
    let (x, mut x_inbox) = join(&handle);
    let (_o, _o_inbox) = join(&handle);
    expect_event(&mut x_inbox, is_start).await;

    let quiet = time::timeout(Duration::from_secs(120), x_inbox.recv()).await;
    assert!(quiet.is_err(), "No deadline should fire in reactive mode");

    // A frame that does not decode still resolves elapsed deadlines.
    handle.message(x, "not json").unwrap();

    match x_inbox.recv().await {
        Some(Outbound::Event(ServerEvent::GameOver { winner, reason, .. })) => {
            assert_eq!(winner, Outcome::Winner(Seat::O));
            assert_eq!(reason, EndReason::Timeout);
        }
        other => panic!("Expected game over, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rematch_window_drops_silent_seat() {
    let (handle, _worker) = SessionHandle::spawn(SessionConfig::default());
    let (x, mut x_inbox) = join(&handle);
    let (o, mut o_inbox) = join(&handle);
    expect_event(&mut x_inbox, is_start).await;

    for (conn, position) in [(x, 0), (o, 3), (x, 1), (o, 4), (x, 2)] {
        handle
            .message(conn, format!(r#"{{"type":"move","position":{}}}"#, position))
            .unwrap();
    }
    expect_event(&mut x_inbox, is_game_over).await;
    expect_event(&mut o_inbox, is_game_over).await;

    handle.message(x, r#"{"type":"rematchVote"}"#).unwrap();
    expect_event(&mut x_inbox, |event| {
        matches!(event, ServerEvent::RematchTimerStart { timeout: 30 })
    })
    .await;
    let t0 = Instant::now();

    expect_event(&mut o_inbox, |event| {
        matches!(event, ServerEvent::TimeoutDisconnect { .. })
    })
    .await;
    assert_eq!(o_inbox.recv().await, Some(Outbound::Close));
    assert!(Instant::now() - t0 >= Duration::from_secs(30));

    expect_event(&mut x_inbox, |event| {
        matches!(event, ServerEvent::WaitingForNewPlayer { .. })
    })
    .await;

    let (_newcomer, mut new_inbox) = join(&handle);
    assert_eq!(
        new_inbox.recv().await,
        Some(Outbound::Event(ServerEvent::Connect {
            symbol: Seat::O,
            message: "You are player O".to_string()
        }))
    );
    expect_event(&mut x_inbox, is_start).await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_notifies_remaining_seat() {
    let (handle, _worker) = SessionHandle::spawn(SessionConfig::default());
    let (_x, mut x_inbox) = join(&handle);
    let (o, _o_inbox) = join(&handle);
    expect_event(&mut x_inbox, is_start).await;

    handle.disconnect(o).unwrap();

    let event = expect_event(&mut x_inbox, |event| {
        matches!(event, ServerEvent::PlayerDisconnected { .. })
    })
    .await;
    assert_eq!(
        event,
        ServerEvent::PlayerDisconnected {
            message: "Player O disconnected".to_string(),
            reset: true
        }
    );

    // The turn deadline went away with the match.
    let quiet = time::timeout(Duration::from_secs(120), x_inbox.recv()).await;
    assert!(quiet.is_err());
}
