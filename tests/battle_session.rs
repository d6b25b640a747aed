//! Integration tests for the battle session view against a loopback room.
//!
//! Watchdog tests run on paused time so the 20 second deadline is instant.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use battle_web::agent::{AgentDirective, BattleAgent, TurnDecision, TurnDetection};
use battle_web::battle::{
    BattleSessionView, BattleUiState, ControlBarView, SessionAlert, SessionPhase,
};
use battle_web::config::BattleSettings;
use battle_web::session::{AgentState, ConnectionState, LoopbackRoom, RealtimeSession};

type Alerts = mpsc::UnboundedReceiver<SessionAlert>;

fn battle_view() -> (Arc<LoopbackRoom>, BattleSessionView<LoopbackRoom>, Alerts) {
    let room = Arc::new(LoopbackRoom::new("player-1").with_agent(BattleAgent::default()));
    let (tx, rx) = mpsc::unbounded_channel();
    let view = BattleSessionView::new(room.clone(), &BattleSettings::default(), tx);
    (room, view, rx)
}

#[tokio::test(start_paused = true)]
async fn agent_that_never_joins_ends_session() {
    let (room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);
    assert_eq!(view.phase(), SessionPhase::Started);

    tokio::time::sleep(Duration::from_secs(19)).await;
    assert!(alerts.try_recv().is_err());
    assert_eq!(room.connection_state(), ConnectionState::Connected);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.title, "Session ended");
    assert_eq!(alert.reason, "Agent did not join the room.");
    assert_eq!(room.connection_state(), ConnectionState::Disconnected);
    assert_eq!(view.phase(), SessionPhase::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn stuck_initializing_agent_gets_its_own_reason() {
    let (room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);
    view.observe_agent_state(AgentState::Initializing);

    tokio::time::sleep(Duration::from_secs(21)).await;

    let alert = alerts.try_recv().unwrap();
    assert_eq!(
        alert.description(),
        "Agent connected but did not complete initializing. See quickstart guide."
    );
    assert_eq!(room.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn ready_agent_keeps_session_alive() {
    let (room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);

    tokio::time::sleep(Duration::from_secs(15)).await;
    view.observe_agent_state(AgentState::Listening);
    assert_eq!(view.phase(), SessionPhase::Ready);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(alerts.try_recv().is_err());
    assert_eq!(room.connection_state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn state_change_restarts_deadline() {
    let (room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);

    tokio::time::sleep(Duration::from_secs(15)).await;
    view.observe_agent_state(AgentState::Initializing);

    // The first deadline would have fired at 20s.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(alerts.try_recv().is_err());
    assert_eq!(room.connection_state(), ConnectionState::Connected);

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(
        alerts.try_recv().unwrap().reason,
        "Agent connected but did not complete initializing."
    );
}

#[tokio::test(start_paused = true)]
async fn unstarted_session_is_never_watched() {
    let (room, mut view, mut alerts) = battle_view();
    view.observe_agent_state(AgentState::Initializing);
    assert!(!view.watchdog().is_armed());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(alerts.try_recv().is_err());
    assert_eq!(room.connection_state(), ConnectionState::Connected);
    assert_eq!(view.phase(), SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn dropping_view_cancels_watchdog() {
    let (room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);

    tokio::time::sleep(Duration::from_secs(5)).await;
    drop(view);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(alerts.try_recv().is_err());
    assert_eq!(room.connection_state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn watchdog_disconnect_resets_control_bar() {
    let (_room, mut view, mut alerts) = battle_view();
    view.set_session_started(true);
    view.control_bar().edit_instructions("be nice");
    view.control_bar().attack().await.unwrap();
    assert!(view.control_bar().state().battle_started);

    tokio::time::sleep(Duration::from_secs(21)).await;

    assert!(alerts.try_recv().is_ok());
    assert_eq!(view.phase(), SessionPhase::Disconnected);
    assert_eq!(view.control_bar().state(), BattleUiState::default());
    assert_eq!(view.view().control_bar, ControlBarView::initial(20));
}

#[tokio::test(start_paused = true)]
async fn external_disconnect_resets_control_bar() {
    let (room, view, _alerts) = battle_view();
    view.control_bar().edit_instructions("be nice");
    view.control_bar().attack().await.unwrap();

    room.set_connection_state(ConnectionState::Reconnecting);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(view.control_bar().state().battle_started);

    room.set_connection_state(ConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(view.control_bar().state(), BattleUiState::default());
}

#[tokio::test]
async fn protect_round_trip_then_shutdown() {
    let (room, mut view, _alerts) = battle_view();
    view.set_session_started(true);
    view.observe_agent_state(AgentState::Listening);

    let bar = view.control_bar();
    bar.edit_instructions("Deflect with kindness");
    bar.protect().await.unwrap();

    assert!(room.microphone_enabled());
    assert!(bar.state().battle_started);
    assert!(view.view().control_bar.shutdown_enabled);
    assert!(!view.view().control_bar.show_battle_buttons);

    match room.directives().as_slice() {
        [AgentDirective::Listen {
            participant,
            turn_detection: TurnDetection::VoiceActivity { .. },
        }] => assert_eq!(participant, "player-1"),
        other => panic!("unexpected directives: {other:?}"),
    }

    // The strategy shapes exactly one user turn.
    assert_eq!(
        room.complete_user_turn("nice try"),
        Some(TurnDecision::Reply(
            "[Defensive Strategy: Deflect with kindness] User said: nice try".to_string()
        ))
    );
    assert_eq!(
        room.complete_user_turn("again"),
        Some(TurnDecision::Reply("again".to_string()))
    );

    bar.shutdown().await.unwrap();

    let state = bar.state();
    assert!(!state.battle_started);
    assert_eq!(state.instructions, "");
    assert_eq!(view.phase(), SessionPhase::Disconnected);
    assert!(!room.microphone_enabled());
}

#[tokio::test]
async fn disabled_view_is_inert() {
    let (_room, mut view, _alerts) = battle_view();
    assert!(!view.view().inert);
    assert!(!view.view().control_bar_revealed);

    view.set_disabled(true);
    view.set_session_started(true);

    let model = view.view();
    assert!(model.inert);
    assert!(model.control_bar_revealed);
    assert_eq!(model.title, "Complimentary Battle Mode");
}
