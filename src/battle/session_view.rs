use super::control_bar::{BattleControlBar, ControlBarView};
use super::watchdog::{AgentWatchdog, SessionAlert};
use crate::config::BattleSettings;
use crate::session::{AgentState, ConnectionState, RealtimeSession};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const BATTLE_TITLE: &str = "Complimentary Battle Mode";

/// Where a battle session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    /// Started, waiting for the agent to become ready.
    Started,
    Ready,
    Disconnected,
}

/// What the session view should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionViewModel {
    pub title: &'static str,
    pub inert: bool,
    pub control_bar_revealed: bool,
    pub phase: SessionPhase,
    pub control_bar: ControlBarView,
}

/// The battle screen: control bar, media tiles and the agent watchdog.
///
/// The view follows the session's connection state on its own: a disconnect
/// resets the control bar however it happened. Dropping the view stops that
/// and cancels any pending watchdog.
///
/// Must be created and driven inside a tokio runtime; both the state
/// follower and the watchdog timer are spawned onto it.
pub struct BattleSessionView<S: RealtimeSession + ?Sized + 'static> {
    session: Arc<S>,
    control_bar: Arc<BattleControlBar<S>>,
    watchdog: AgentWatchdog,
    follower: CancellationToken,
    session_started: bool,
    agent_state: AgentState,
    disabled: bool,
}

impl<S: RealtimeSession + ?Sized + 'static> BattleSessionView<S> {
    pub fn new(
        session: Arc<S>,
        settings: &BattleSettings,
        alerts: mpsc::UnboundedSender<SessionAlert>,
    ) -> Self {
        let control_bar = Arc::new(BattleControlBar::with_word_limit(
            session.clone(),
            settings.max_instruction_words,
        ));
        let follower = CancellationToken::new();
        follow_connection_state(&*session, control_bar.clone(), follower.clone());

        Self {
            control_bar,
            session,
            watchdog: AgentWatchdog::new(settings.agent_ready_timeout(), alerts),
            follower,
            session_started: false,
            agent_state: AgentState::default(),
            disabled: false,
        }
    }

    pub fn control_bar(&self) -> &BattleControlBar<S> {
        &self.control_bar
    }

    pub fn watchdog(&self) -> &AgentWatchdog {
        &self.watchdog
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent_state
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_session_started(&mut self, started: bool) {
        if self.session_started != started {
            self.session_started = started;
            self.rearm();
        }
    }

    pub fn observe_agent_state(&mut self, state: AgentState) {
        if self.agent_state != state {
            self.agent_state = state;
            self.rearm();
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.session_started {
            SessionPhase::Idle
        } else if self.session.connection_state() == ConnectionState::Disconnected {
            SessionPhase::Disconnected
        } else if self.agent_state.is_ready() {
            SessionPhase::Ready
        } else {
            SessionPhase::Started
        }
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            title: BATTLE_TITLE,
            inert: self.disabled,
            control_bar_revealed: self.session_started,
            phase: self.phase(),
            control_bar: self.control_bar.view(),
        }
    }

    fn rearm(&mut self) {
        self.watchdog
            .arm(self.session.clone(), self.session_started, self.agent_state);
    }
}

impl<S: RealtimeSession + ?Sized + 'static> Drop for BattleSessionView<S> {
    fn drop(&mut self) {
        self.follower.cancel();
    }
}

/// Forward every connection state change to the control bar until cancelled.
fn follow_connection_state<S>(
    session: &S,
    control_bar: Arc<BattleControlBar<S>>,
    cancel: CancellationToken,
) where
    S: RealtimeSession + ?Sized + 'static,
{
    let mut state_rx = session.subscribe_connection_state();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *state_rx.borrow_and_update();
                    debug!("Session connection state changed to {:?}", state);
                    control_bar.on_connection_state(state);
                }
            }
        }
    });
}
