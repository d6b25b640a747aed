//! The real-time session seam.
//!
//! Media transport, room state sync and RPC framing belong to an external
//! real-time SDK. This module describes the part of that SDK the battle UI
//! talks to, so controllers can be written (and tested) against a trait.

mod loopback;

pub use loopback::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::watch;

// ============================================================================
// States
// ============================================================================

/// Connection state of the local participant's room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Observed state of the remote agent participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Disconnected,
    #[default]
    Connecting,
    Initializing,
    Listening,
    Thinking,
    Speaking,
}

impl AgentState {
    /// Whether the agent has finished initializing and is taking turns.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            AgentState::Listening | AgentState::Thinking | AgentState::Speaking
        )
    }
}

// ============================================================================
// Participants
// ============================================================================

/// A remote participant in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub identity: String,
    #[serde(default)]
    pub is_agent: bool,
    /// Participant attributes published to the room.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Participant {
    pub fn user(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            is_agent: false,
            attributes: BTreeMap::new(),
        }
    }

    pub fn agent(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            is_agent: true,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Snapshot of the remote participants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// The first participant flagged as an agent.
    pub fn agent(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_agent)
    }

    pub fn find(&self, identity: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

// ============================================================================
// RPC
// ============================================================================

/// A named, payload-carrying request to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub destination_identity: String,
    pub method: String,
    pub payload: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("not connected")]
    NotConnected,
    #[error("no such participant: {0}")]
    UnknownParticipant(String),
    #[error("rpc '{method}' failed: {message}")]
    Rpc { method: String, message: String },
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// Operations the battle UI performs on the real-time session.
#[async_trait]
pub trait RealtimeSession: Send + Sync {
    fn connection_state(&self) -> ConnectionState;

    /// Receive every connection state change, however it was caused.
    fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState>;

    /// Current remote participants.
    fn roster(&self) -> Roster;

    /// Perform an RPC and await its response payload.
    async fn perform_rpc(&self, request: RpcRequest) -> Result<String, SessionError>;

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), SessionError>;

    async fn disconnect(&self) -> Result<(), SessionError>;
}
