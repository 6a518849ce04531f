//! Agent decisions recorded per turn

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Structured Monitor output driving the tension update
///
/// Only `new_tension` is acted on; it is clamped on apply, nothing else is
/// validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPayload {
    /// Proposed tension, may be out of range
    pub new_tension: i64,
    /// Model's explanation
    #[serde(default)]
    pub reasoning: String,
    /// validation / logic / dismissal / empathy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique_used: Option<String>,
}

/// Which agent produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agent {
    Monitor,
    Director,
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Agent::Monitor => "Monitor",
            Agent::Director => "Director",
        };
        write!(f, "{}", name)
    }
}

/// Decision log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDecision {
    pub turn: u32,
    pub agent: Agent,
    /// Monitor payload, or `{"complication": ...}` for the Director
    pub decision: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AgentDecision {
    pub fn new(turn: u32, agent: Agent, decision: serde_json::Value) -> Self {
        Self {
            turn,
            agent,
            decision,
            timestamp: Utc::now(),
        }
    }
}
