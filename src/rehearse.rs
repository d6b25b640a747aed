//! Scripted battle against an in-process agent.

use crate::agent::{AgentDirective, BattleAgent};
use crate::battle::{BattleSessionView, EditOutcome, SessionAlert, SessionPhase};
use crate::config::BattleSettings;
use crate::session::{AgentState, ConnectionState, LoopbackRoom, RealtimeSession};

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehearsalMode {
    Attack,
    Protect,
    /// The agent never becomes ready; the watchdog ends the session.
    AgentNeverReady,
}

#[derive(Debug, Clone)]
pub struct RehearsalReport {
    pub directives: Vec<AgentDirective>,
    pub microphone_enabled: bool,
    pub battle_started: bool,
    pub alert: Option<SessionAlert>,
    pub final_phase: SessionPhase,
}

pub const REHEARSAL_IDENTITY: &str = "rehearsal-user";

/// What the rehearsal user says after responding.
pub const REHEARSAL_USER_TURN: &str = "Your rhymes are as stale as last week's bread";

/// Run one battle in a loopback room and report what happened.
pub async fn run_rehearsal(
    settings: &BattleSettings,
    instructions: &str,
    mode: RehearsalMode,
) -> Result<RehearsalReport> {
    let room = Arc::new(LoopbackRoom::new(REHEARSAL_IDENTITY).with_agent(BattleAgent::default()));
    let (alert_tx, mut alert_rx) = mpsc::unbounded_channel();
    let mut view = BattleSessionView::new(room.clone(), settings, alert_tx);

    view.set_session_started(true);
    view.observe_agent_state(AgentState::Connecting);

    if mode == RehearsalMode::AgentNeverReady {
        info!("Waiting for the agent watchdog to fire");
        let grace = settings.agent_ready_timeout() + Duration::from_secs(1);
        let mut state_rx = room.subscribe_connection_state();
        let alert = tokio::time::timeout(grace, alert_rx.recv()).await.ok().flatten();
        if alert.is_some() {
            // The alert goes out just before the disconnect.
            let _ = tokio::time::timeout(
                Duration::from_secs(1),
                state_rx.wait_for(|s| *s == ConnectionState::Disconnected),
            )
            .await;
        }

        return Ok(RehearsalReport {
            directives: room.directives(),
            microphone_enabled: room.microphone_enabled(),
            battle_started: view.control_bar().state().battle_started,
            alert,
            final_phase: view.phase(),
        });
    }

    view.observe_agent_state(AgentState::Listening);

    if let EditOutcome::Rejected { word_count } = view.control_bar().edit_instructions(instructions) {
        bail!(
            "instructions have {} words, the limit is {}",
            word_count,
            view.control_bar().max_words()
        );
    }

    match mode {
        RehearsalMode::Protect => {
            view.control_bar().protect().await?;
            room.complete_user_turn(REHEARSAL_USER_TURN);
        }
        _ => view.control_bar().attack().await?,
    }

    let directives = room.directives();
    let microphone_enabled = room.microphone_enabled();
    let battle_started = view.control_bar().state().battle_started;
    info!("Battle started, agent directives: {:?}", directives);

    view.control_bar().shutdown().await?;

    Ok(RehearsalReport {
        directives,
        microphone_enabled,
        battle_started,
        alert: alert_rx.try_recv().ok(),
        final_phase: view.phase(),
    })
}
