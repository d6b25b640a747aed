use crate::agent::{ATTACK_METHOD, PROTECT_METHOD};
use crate::config::DEFAULT_MAX_INSTRUCTION_WORDS;
use crate::session::{ConnectionState, Participant, RealtimeSession, RpcRequest, SessionError};

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Client-local state of the control bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleUiState {
    pub instructions: String,
    pub word_count: usize,
    pub busy: bool,
    pub battle_started: bool,
}

/// Result of editing the instructions input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Accepted { word_count: usize },
    /// The edit would exceed the word limit; the input keeps its old value.
    Rejected { word_count: usize },
}

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("another action is in progress")]
    Busy,
    #[error("instructions are empty")]
    EmptyInstructions,
    #[error("no agent found in the room")]
    NoAgent,
    #[error("rpc failed: {0}")]
    Rpc(#[source] SessionError),
    #[error("failed to enable microphone: {0}")]
    Microphone(#[source] SessionError),
    #[error("failed to disconnect: {0}")]
    Disconnect(#[source] SessionError),
}

/// What the control bar should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBarView {
    pub instructions: String,
    pub show_instructions: bool,
    pub word_count_label: String,
    pub show_battle_buttons: bool,
    pub attack_enabled: bool,
    pub protect_enabled: bool,
    pub shutdown_enabled: bool,
}

impl ControlBarView {
    /// The view before any input.
    pub fn initial(max_words: usize) -> Self {
        Self {
            instructions: String::new(),
            show_instructions: true,
            word_count_label: format!("0 / {max_words} words"),
            show_battle_buttons: true,
            attack_enabled: false,
            protect_enabled: false,
            shutdown_enabled: true,
        }
    }
}

/// Clears the busy flag when an action ends, however it ends.
struct BusyGuard<'a> {
    state: &'a Mutex<BattleUiState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().busy = false;
    }
}

/// Battle controls bound to a real-time session.
///
/// Attack, protect and shutdown share one busy flag, so at most one of them
/// is in flight at a time.
pub struct BattleControlBar<S: RealtimeSession + ?Sized> {
    session: Arc<S>,
    state: Mutex<BattleUiState>,
    max_words: usize,
}

impl<S: RealtimeSession + ?Sized> BattleControlBar<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self::with_word_limit(session, DEFAULT_MAX_INSTRUCTION_WORDS)
    }

    pub fn with_word_limit(session: Arc<S>, max_words: usize) -> Self {
        Self {
            session,
            state: Mutex::new(BattleUiState::default()),
            max_words,
        }
    }

    pub fn state(&self) -> BattleUiState {
        self.state.lock().clone()
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Replace the instructions, unless the new text has too many words.
    pub fn edit_instructions(&self, text: &str) -> EditOutcome {
        let word_count = count_words(text);
        if word_count > self.max_words {
            debug!("Rejected instructions edit with {} words", word_count);
            return EditOutcome::Rejected { word_count };
        }

        let mut state = self.state.lock();
        state.instructions = text.to_string();
        state.word_count = word_count;
        EditOutcome::Accepted { word_count }
    }

    /// React to a connection state change; a disconnect resets the battle.
    pub fn on_connection_state(&self, connection: ConnectionState) {
        if connection != ConnectionState::Disconnected {
            return;
        }

        let mut state = self.state.lock();
        state.battle_started = false;
        state.instructions.clear();
        state.word_count = 0;
    }

    /// Send the instructions to the agent as an attack.
    pub async fn attack(&self) -> Result<(), BattleError> {
        let _busy = self.begin()?;
        let (agent, instructions) = self.prepare("attack")?;

        self.call(&agent, ATTACK_METHOD, instructions)
            .await
            .map_err(|e| {
                error!("Failed to attack: {}", e);
                BattleError::Rpc(e)
            })?;

        info!("Attack sent to {}", agent.identity);
        self.state.lock().battle_started = true;
        Ok(())
    }

    /// Send the instructions as a defensive strategy and open the microphone.
    pub async fn protect(&self) -> Result<(), BattleError> {
        let _busy = self.begin()?;
        let (agent, instructions) = self.prepare("protect")?;

        self.call(&agent, PROTECT_METHOD, instructions)
            .await
            .map_err(|e| {
                error!("Failed to protect: {}", e);
                BattleError::Rpc(e)
            })?;

        self.session
            .set_microphone_enabled(true)
            .await
            .map_err(|e| {
                error!("Failed to protect: {}", e);
                BattleError::Microphone(e)
            })?;

        info!("Protect sent to {}, microphone enabled", agent.identity);
        self.state.lock().battle_started = true;
        Ok(())
    }

    /// Disconnect from the session, whether or not the battle has started.
    pub async fn shutdown(&self) -> Result<(), BattleError> {
        let _busy = self.begin()?;

        self.session.disconnect().await.map_err(|e| {
            error!("Failed to shut down: {}", e);
            BattleError::Disconnect(e)
        })?;

        self.on_connection_state(self.session.connection_state());
        Ok(())
    }

    pub fn view(&self) -> ControlBarView {
        let state = self.state.lock();
        let has_instructions = !state.instructions.trim().is_empty();
        let hidden = state.battle_started;

        ControlBarView {
            instructions: state.instructions.clone(),
            show_instructions: !hidden,
            word_count_label: format!("{} / {} words", state.word_count, self.max_words),
            show_battle_buttons: !hidden,
            attack_enabled: !hidden && !state.busy && has_instructions,
            protect_enabled: !hidden && !state.busy && has_instructions,
            shutdown_enabled: !state.busy,
        }
    }

    fn begin(&self) -> Result<BusyGuard<'_>, BattleError> {
        let mut state = self.state.lock();
        if state.busy {
            return Err(BattleError::Busy);
        }
        state.busy = true;
        Ok(BusyGuard { state: &self.state })
    }

    /// Check the instructions and find the agent to send them to.
    fn prepare(&self, action: &str) -> Result<(Participant, String), BattleError> {
        let instructions = self.state.lock().instructions.clone();
        if instructions.trim().is_empty() {
            debug!("Refusing {} without instructions", action);
            return Err(BattleError::EmptyInstructions);
        }

        match self.session.roster().agent() {
            Some(agent) => Ok((agent.clone(), instructions)),
            None => {
                error!("No agent found in the room");
                Err(BattleError::NoAgent)
            }
        }
    }

    async fn call(
        &self,
        agent: &Participant,
        method: &str,
        payload: String,
    ) -> Result<String, SessionError> {
        self.session
            .perform_rpc(RpcRequest {
                destination_identity: agent.identity.clone(),
                method: method.to_string(),
                payload,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{BattleAgent, AGENT_IDENTITY};
    use crate::session::LoopbackRoom;
    use pretty_assertions::assert_eq;

    fn bar_with_agent() -> (Arc<LoopbackRoom>, BattleControlBar<LoopbackRoom>) {
        let room = Arc::new(LoopbackRoom::new("user-1").with_agent(BattleAgent::default()));
        let bar = BattleControlBar::new(room.clone());
        (room, bar)
    }

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn counts_whitespace_runs() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("  you   are\tgreat \n"), 3);
    }

    #[test]
    fn edits_up_to_limit_are_accepted() {
        let (_, bar) = bar_with_agent();
        assert_eq!(
            bar.edit_instructions(&words(20)),
            EditOutcome::Accepted { word_count: 20 }
        );
        assert_eq!(bar.state().word_count, 20);
    }

    #[test]
    fn edit_over_limit_keeps_previous_text() {
        let (_, bar) = bar_with_agent();
        let valid = words(20);
        bar.edit_instructions(&valid);

        let outcome = bar.edit_instructions(&format!("{valid} w21"));

        assert_eq!(outcome, EditOutcome::Rejected { word_count: 21 });
        let state = bar.state();
        assert_eq!(state.instructions, valid);
        assert_eq!(state.word_count, 20);
        assert_eq!(bar.view().word_count_label, "20 / 20 words");
    }

    #[test]
    fn shrinking_edit_is_accepted() {
        let (_, bar) = bar_with_agent();
        bar.edit_instructions(&words(20));
        assert_eq!(
            bar.edit_instructions(&words(3)),
            EditOutcome::Accepted { word_count: 3 }
        );
    }

    #[test]
    fn trailing_space_does_not_count() {
        let (_, bar) = bar_with_agent();
        let text = format!("{} ", words(20));
        assert_eq!(
            bar.edit_instructions(&text),
            EditOutcome::Accepted { word_count: 20 }
        );
        assert_eq!(bar.state().instructions, text);
    }

    #[tokio::test]
    async fn attack_marks_battle_started() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("talk about shoes");

        bar.attack().await.unwrap();

        let state = bar.state();
        assert!(state.battle_started);
        assert!(!state.busy);
        let view = bar.view();
        assert!(!view.show_battle_buttons);
        assert!(!view.show_instructions);
        assert!(view.shutdown_enabled);

        let sent = room.rpc_history();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination_identity, AGENT_IDENTITY);
        assert_eq!(sent[0].method, "attack");
        assert_eq!(sent[0].payload, "talk about shoes");
        assert!(!room.microphone_enabled());
    }

    #[tokio::test]
    async fn protect_enables_microphone() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("stay humble");

        bar.protect().await.unwrap();

        assert!(bar.state().battle_started);
        assert!(room.microphone_enabled());
        assert_eq!(room.rpc_history()[0].method, "protect");
    }

    #[tokio::test]
    async fn empty_instructions_rejected() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("   ");
        assert!(!bar.view().attack_enabled);

        assert!(matches!(bar.attack().await, Err(BattleError::EmptyInstructions)));
        assert!(room.rpc_history().is_empty());
        assert!(!bar.state().busy);
    }

    #[tokio::test]
    async fn missing_agent_leaves_state_unchanged() {
        let room = Arc::new(LoopbackRoom::new("user-1"));
        room.add_participant(Participant::user("someone"));
        let bar = BattleControlBar::new(room.clone());
        bar.edit_instructions("hello there");
        let before = bar.state();

        assert!(matches!(bar.attack().await, Err(BattleError::NoAgent)));
        assert!(matches!(bar.protect().await, Err(BattleError::NoAgent)));

        assert_eq!(bar.state(), before);
        assert!(room.rpc_history().is_empty());
    }

    #[tokio::test]
    async fn rpc_failure_clears_busy_only() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("hello");
        room.fail_next_rpc("agent unavailable");

        assert!(matches!(bar.attack().await, Err(BattleError::Rpc(_))));

        let state = bar.state();
        assert!(!state.busy);
        assert!(!state.battle_started);
        assert_eq!(state.instructions, "hello");
    }

    #[tokio::test]
    async fn shutdown_disconnects_before_battle() {
        let (room, bar) = bar_with_agent();
        bar.shutdown().await.unwrap();
        assert_eq!(room.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn shutdown_after_battle_resets_state() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("hi");
        bar.attack().await.unwrap();

        bar.shutdown().await.unwrap();

        assert_eq!(room.connection_state(), ConnectionState::Disconnected);
        assert_eq!(bar.state(), BattleUiState::default());
        assert_eq!(bar.view(), ControlBarView::initial(20));
    }

    #[tokio::test]
    async fn protect_rpc_failure_keeps_microphone_off() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("stay humble");
        room.fail_next_rpc("agent unavailable");

        assert!(matches!(bar.protect().await, Err(BattleError::Rpc(_))));

        let state = bar.state();
        assert!(!state.busy);
        assert!(!state.battle_started);
        assert_eq!(state.instructions, "stay humble");
        assert!(!room.microphone_enabled());
    }

    #[tokio::test]
    async fn protect_microphone_failure_does_not_start_battle() {
        let (room, bar) = bar_with_agent();
        bar.edit_instructions("stay humble");
        room.fail_next_microphone("permission denied");

        let err = bar.protect().await.unwrap_err();
        assert!(matches!(
            err,
            BattleError::Microphone(SessionError::Microphone(ref m)) if m == "permission denied"
        ));

        // The strategy already reached the agent.
        assert_eq!(room.rpc_history().len(), 1);
        assert_eq!(room.rpc_history()[0].method, "protect");
        let state = bar.state();
        assert!(!state.busy);
        assert!(!state.battle_started);
        assert!(!room.microphone_enabled());
        assert!(bar.view().protect_enabled);
    }

    #[tokio::test]
    async fn disconnect_resets_state() {
        let (_, bar) = bar_with_agent();
        bar.edit_instructions("one two three");
        bar.attack().await.unwrap();

        bar.on_connection_state(ConnectionState::Connected);
        assert!(bar.state().battle_started);

        bar.on_connection_state(ConnectionState::Disconnected);
        assert_eq!(bar.state(), BattleUiState::default());
        assert!(bar.view().show_battle_buttons);
    }

    #[test]
    fn busy_blocks_other_actions() {
        let (_, bar) = bar_with_agent();
        bar.edit_instructions("hi");

        let guard = bar.begin().unwrap();
        assert!(matches!(bar.begin(), Err(BattleError::Busy)));
        let view = bar.view();
        assert!(!view.attack_enabled);
        assert!(!view.protect_enabled);
        assert!(!view.shutdown_enabled);

        drop(guard);
        assert!(!bar.state().busy);
        assert!(bar.view().attack_enabled);
    }
}
