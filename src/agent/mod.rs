//! Agent-side counterpart of the battle RPCs.
//!
//! The voice pipeline (speech-to-text, model, text-to-speech) is external.
//! [`BattleAgent`] only tracks the battle state the RPCs mutate and tells the
//! pipeline what to do next through [`AgentDirective`]s.

mod prompt;

pub use prompt::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Identity the agent accepts jobs under.
pub const AGENT_IDENTITY: &str = "ptt-agent";

/// Participant attribute advertising push-to-talk support to the front-end.
pub const PUSH_TO_TALK_ATTRIBUTE: (&str, &str) = ("push-to-talk", "1");

pub const ATTACK_METHOD: &str = "attack";
pub const PROTECT_METHOD: &str = "protect";

/// Silence required before a protect-mode turn is considered finished.
pub const PROTECT_MIN_ENDPOINTING_DELAY: Duration = Duration::from_secs(3);

/// How the end of a user turn is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum TurnDetection {
    /// Push-to-talk: turns are committed explicitly.
    #[default]
    Manual,
    /// Voice activity detection with a minimum trailing silence.
    VoiceActivity { min_endpointing_delay: Duration },
}

/// An incoming RPC, as seen by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcInvocation {
    pub caller_identity: String,
    pub method: String,
    pub payload: String,
}

/// What the voice pipeline should do after an RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDirective {
    /// Generate a reply as if the user had said `user_input`.
    GenerateReply { user_input: String },
    /// Start taking audio from `participant` with the given turn detection.
    Listen {
        participant: String,
        turn_detection: TurnDetection,
    },
}

/// Outcome of a completed user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDecision {
    Reply(String),
    Skip,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("unsupported rpc method: {0}")]
    UnknownMethod(String),
}

/// Battle state held by the agent for one room.
#[derive(Debug, Clone)]
pub struct BattleAgent {
    instructions: String,
    protect_instructions: Option<String>,
    turn_detection: TurnDetection,
    listening_to: Option<String>,
    audio_input_enabled: bool,
}

impl BattleAgent {
    /// Create an agent; empty custom instructions select [`BATTLE_PROMPT`].
    pub fn new(custom_instructions: &str) -> Self {
        let instructions = if custom_instructions.is_empty() {
            BATTLE_PROMPT.to_string()
        } else {
            custom_instructions.to_string()
        };

        Self {
            instructions,
            protect_instructions: None,
            turn_detection: TurnDetection::Manual,
            listening_to: None,
            // Push-to-talk: audio input starts disabled.
            audio_input_enabled: false,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn protect_instructions(&self) -> Option<&str> {
        self.protect_instructions.as_deref()
    }

    pub fn turn_detection(&self) -> TurnDetection {
        self.turn_detection
    }

    pub fn listening_to(&self) -> Option<&str> {
        self.listening_to.as_deref()
    }

    pub fn audio_input_enabled(&self) -> bool {
        self.audio_input_enabled
    }

    /// Dispatch an RPC by method name.
    pub fn handle_rpc(&mut self, invocation: &RpcInvocation) -> Result<AgentDirective, AgentError> {
        match invocation.method.as_str() {
            ATTACK_METHOD => Ok(self.attack(&invocation.caller_identity, &invocation.payload)),
            PROTECT_METHOD => Ok(self.protect(&invocation.caller_identity, &invocation.payload)),
            other => Err(AgentError::UnknownMethod(other.to_string())),
        }
    }

    pub fn attack(&mut self, caller: &str, payload: &str) -> AgentDirective {
        info!("attack called by {} with instructions: {}", caller, payload);
        AgentDirective::GenerateReply {
            user_input: attack_input(payload),
        }
    }

    pub fn protect(&mut self, caller: &str, payload: &str) -> AgentDirective {
        info!("protect called by {} with instructions: {}", caller, payload);

        if !payload.is_empty() {
            self.protect_instructions = Some(payload.to_string());
        }

        self.turn_detection = TurnDetection::VoiceActivity {
            min_endpointing_delay: PROTECT_MIN_ENDPOINTING_DELAY,
        };
        self.listening_to = Some(caller.to_string());
        self.audio_input_enabled = true;

        info!(
            "Protect mode: voice activity detection with {}s silence threshold",
            PROTECT_MIN_ENDPOINTING_DELAY.as_secs()
        );

        AgentDirective::Listen {
            participant: caller.to_string(),
            turn_detection: self.turn_detection,
        }
    }

    /// Decide what to do with a committed user turn.
    ///
    /// Pending protect instructions are applied to exactly one turn.
    pub fn on_user_turn_completed(&mut self, text: &str) -> TurnDecision {
        let text = match self.protect_instructions.take() {
            Some(strategy) => {
                info!("Applying protect instructions: {}", strategy);
                defensive_turn(&strategy, text)
            }
            None => text.to_string(),
        };

        if text.is_empty() {
            info!("ignore empty user turn");
            return TurnDecision::Skip;
        }

        TurnDecision::Reply(text)
    }
}

impl Default for BattleAgent {
    fn default() -> Self {
        Self::new("")
    }
}
