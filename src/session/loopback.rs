use super::{ConnectionState, Participant, RealtimeSession, Roster, RpcRequest, SessionError};
use crate::agent::{
    AgentDirective, BattleAgent, RpcInvocation, TurnDecision, AGENT_IDENTITY, PUSH_TO_TALK_ATTRIBUTE,
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

/// An in-process room.
///
/// RPCs addressed to the attached [`BattleAgent`] are dispatched to it
/// directly; the directives it returns are recorded for inspection.
pub struct LoopbackRoom {
    local_identity: String,
    participants: RwLock<Vec<Participant>>,
    agent: Option<Mutex<BattleAgent>>,
    state_tx: watch::Sender<ConnectionState>,
    microphone: AtomicBool,
    rpc_log: Mutex<Vec<RpcRequest>>,
    directives: Mutex<Vec<AgentDirective>>,
    injected_failure: Mutex<Option<String>>,
    microphone_failure: Mutex<Option<String>>,
}

impl LoopbackRoom {
    /// A connected room with no remote participants.
    pub fn new(local_identity: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Connected);
        Self {
            local_identity: local_identity.into(),
            participants: RwLock::new(Vec::new()),
            agent: None,
            state_tx,
            microphone: AtomicBool::new(false),
            rpc_log: Mutex::new(Vec::new()),
            directives: Mutex::new(Vec::new()),
            injected_failure: Mutex::new(None),
            microphone_failure: Mutex::new(None),
        }
    }

    /// Attach a push-to-talk agent under [`AGENT_IDENTITY`].
    pub fn with_agent(mut self, agent: BattleAgent) -> Self {
        let (key, value) = PUSH_TO_TALK_ATTRIBUTE;
        self.participants
            .get_mut()
            .push(Participant::agent(AGENT_IDENTITY).with_attribute(key, value));
        self.agent = Some(Mutex::new(agent));
        self
    }

    pub fn add_participant(&self, participant: Participant) {
        self.participants.write().push(participant);
    }

    pub fn local_identity(&self) -> &str {
        &self.local_identity
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    pub fn microphone_enabled(&self) -> bool {
        self.microphone.load(Ordering::Acquire)
    }

    /// Make the next RPC fail with `message`.
    pub fn fail_next_rpc(&self, message: impl Into<String>) {
        *self.injected_failure.lock() = Some(message.into());
    }

    /// Make the next microphone toggle fail with `message`.
    pub fn fail_next_microphone(&self, message: impl Into<String>) {
        *self.microphone_failure.lock() = Some(message.into());
    }

    /// Commit a user turn to the attached agent.
    ///
    /// A reply is recorded as a directive. Returns `None` without an agent.
    pub fn complete_user_turn(&self, text: &str) -> Option<TurnDecision> {
        let decision = self.agent.as_ref()?.lock().on_user_turn_completed(text);
        if let TurnDecision::Reply(user_input) = &decision {
            debug!("Agent replying to user turn: {}", user_input);
            self.directives.lock().push(AgentDirective::GenerateReply {
                user_input: user_input.clone(),
            });
        }
        Some(decision)
    }

    pub fn rpc_history(&self) -> Vec<RpcRequest> {
        self.rpc_log.lock().clone()
    }

    pub fn directives(&self) -> Vec<AgentDirective> {
        self.directives.lock().clone()
    }

    /// Snapshot of the attached agent's state.
    pub fn agent(&self) -> Option<BattleAgent> {
        self.agent.as_ref().map(|a| a.lock().clone())
    }
}

#[async_trait]
impl RealtimeSession for LoopbackRoom {
    fn connection_state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn roster(&self) -> Roster {
        Roster::new(self.participants.read().clone())
    }

    async fn perform_rpc(&self, request: RpcRequest) -> Result<String, SessionError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }

        self.rpc_log.lock().push(request.clone());

        if let Some(message) = self.injected_failure.lock().take() {
            return Err(SessionError::Rpc {
                method: request.method,
                message,
            });
        }

        if self.roster().find(&request.destination_identity).is_none() {
            return Err(SessionError::UnknownParticipant(request.destination_identity));
        }

        let agent = match &self.agent {
            Some(agent) if request.destination_identity == AGENT_IDENTITY => agent,
            _ => {
                return Err(SessionError::Rpc {
                    method: request.method,
                    message: "method not registered".to_string(),
                })
            }
        };

        let invocation = RpcInvocation {
            caller_identity: self.local_identity.clone(),
            method: request.method.clone(),
            payload: request.payload,
        };

        let directive = agent
            .lock()
            .handle_rpc(&invocation)
            .map_err(|e| SessionError::Rpc {
                method: request.method,
                message: e.to_string(),
            })?;

        debug!("Agent directive: {:?}", directive);
        self.directives.lock().push(directive);
        Ok(String::new())
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        if let Some(message) = self.microphone_failure.lock().take() {
            return Err(SessionError::Microphone(message));
        }
        self.microphone.store(enabled, Ordering::Release);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SessionError> {
        info!("Disconnecting {} from loopback room", self.local_identity);
        self.microphone.store(false, Ordering::Release);
        self.set_connection_state(ConnectionState::Disconnected);
        Ok(())
    }
}
