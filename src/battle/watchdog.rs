use crate::session::{AgentState, RealtimeSession};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const QUICKSTART_GUIDE_URL: &str = "https://docs.livekit.io/agents/start/voice-ai/";

/// A user-visible notice raised when a session is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAlert {
    pub title: String,
    pub reason: String,
    pub guide_url: String,
}

impl SessionAlert {
    /// The alert for an agent that was not ready in time.
    pub fn agent_not_ready(state: AgentState) -> Self {
        let reason = if state == AgentState::Connecting {
            "Agent did not join the room."
        } else {
            "Agent connected but did not complete initializing."
        };

        Self {
            title: "Session ended".to_string(),
            reason: reason.to_string(),
            guide_url: QUICKSTART_GUIDE_URL.to_string(),
        }
    }

    pub fn description(&self) -> String {
        format!("{} See quickstart guide.", self.reason)
    }
}

/// Liveness deadline on the agent becoming ready.
///
/// Each [`arm`](Self::arm) cancels the previous timer, so only the most
/// recent inputs can ever fire. Dropping the watchdog cancels it too.
pub struct AgentWatchdog {
    timeout: Duration,
    alerts: mpsc::UnboundedSender<SessionAlert>,
    current: Option<CancellationToken>,
}

impl AgentWatchdog {
    pub fn new(timeout: Duration, alerts: mpsc::UnboundedSender<SessionAlert>) -> Self {
        Self {
            timeout,
            alerts,
            current: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Restart the deadline for the given inputs.
    ///
    /// Nothing is scheduled unless the session has started.
    ///
    /// # Panics
    ///
    /// Spawns the timer onto the current tokio runtime, so it panics when
    /// called outside one.
    pub fn arm<S>(&mut self, session: Arc<S>, session_started: bool, agent_state: AgentState)
    where
        S: RealtimeSession + ?Sized + 'static,
    {
        self.cancel();
        if !session_started {
            return;
        }

        let token = CancellationToken::new();
        self.current = Some(token.clone());

        let timeout = self.timeout;
        let alerts = self.alerts.clone();

        debug!(
            "Agent watchdog armed for {:?} with agent state {:?}",
            timeout, agent_state
        );

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if agent_state.is_ready() {
                        return;
                    }

                    let alert = SessionAlert::agent_not_ready(agent_state);
                    warn!("{}: {}", alert.title, alert.reason);
                    if let Err(e) = alerts.send(alert) {
                        warn!("Session alert dropped, no receiver: {}", e.0.reason);
                    }

                    if let Err(e) = session.disconnect().await {
                        error!("Failed to disconnect after agent timeout: {}", e);
                    }
                }
            }
        });
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for AgentWatchdog {
    fn drop(&mut self) {
        self.cancel();
    }
}
