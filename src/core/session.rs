//! Session state: tension, rolling history, message and decision logs
//!
//! Owned by the TurnController; nothing else mutates it.

use std::collections::VecDeque;
use serde::Serialize;
use crate::HISTORY_LEN;
use crate::types::{
    clamp_tension, heart_rate, AgentDecision, ChatMessage, Role, Scenario, TensionBand,
};

/// Mutable state of one practice session
#[derive(Debug, Clone)]
pub struct SessionState {
    scenario: Scenario,
    tension: u8,
    /// Most-recent-last, always exactly HISTORY_LEN long
    history: VecDeque<u8>,
    messages: Vec<ChatMessage>,
    decisions: Vec<AgentDecision>,
    turn_count: u32,
}

/// Read-only view for display and the API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub scenario: Scenario,
    pub tension: u8,
    pub heart_rate: u16,
    pub band: TensionBand,
    pub history: Vec<u8>,
    pub turn_count: u32,
    pub message_count: usize,
    pub decision_count: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Scenario::default())
    }
}

impl SessionState {
    pub fn new(scenario: Scenario) -> Self {
        let tension = scenario.initial_tension();
        Self {
            scenario,
            tension,
            history: std::iter::repeat(tension).take(HISTORY_LEN).collect(),
            messages: Vec::new(),
            decisions: Vec::new(),
            turn_count: 0,
        }
    }

    /// Set tension from a raw model score, clamped to 0..=100
    pub fn apply_tension(&mut self, raw: i64) -> u8 {
        self.tension = clamp_tension(raw);
        self.tension
    }

    /// Append current tension to the history, dropping the oldest entry
    pub fn push_history(&mut self) {
        self.history.push_back(self.tension);
        while self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn log_decision(&mut self, decision: AgentDecision) {
        self.decisions.push(decision);
    }

    /// Advance and return the new 1-based turn number
    pub fn next_turn(&mut self) -> u32 {
        self.turn_count += 1;
        self.turn_count
    }

    /// Back to the scenario's starting point
    pub fn reset(&mut self) {
        *self = Self::new(self.scenario);
    }

    /// Switch scenario; always starts over
    pub fn set_scenario(&mut self, scenario: Scenario) {
        *self = Self::new(scenario);
    }

    /// Last `n` user/ai lines formatted for the Actor prompt
    pub fn recent_dialogue(&self, n: usize) -> String {
        let lines: Vec<String> = self
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(ChatMessage::to_prompt_line)
            .collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }

    /// True once any user/ai exchange has happened
    pub fn has_exchanges(&self) -> bool {
        self.messages.iter().any(|m| m.role != Role::System)
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn tension(&self) -> u8 {
        self.tension
    }

    pub fn heart_rate(&self) -> u16 {
        heart_rate(self.tension)
    }

    pub fn band(&self) -> TensionBand {
        TensionBand::from_tension(self.tension)
    }

    pub fn history(&self) -> Vec<u8> {
        self.history.iter().copied().collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn decisions(&self) -> &[AgentDecision] {
        &self.decisions
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            scenario: self.scenario,
            tension: self.tension,
            heart_rate: self.heart_rate(),
            band: self.band(),
            history: self.history(),
            turn_count: self.turn_count,
            message_count: self.messages.len(),
            decision_count: self.decisions.len(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Agent;

    #[test]
    fn test_initial_state() {
        let state = SessionState::default();
        assert_eq!(state.tension(), 100);
        assert_eq!(state.history(), vec![100; HISTORY_LEN]);
        assert!(state.messages().is_empty());
        assert!(state.decisions().is_empty());
    }

    #[test]
    fn test_apply_tension_clamps() {
        let mut state = SessionState::default();
        assert_eq!(state.apply_tension(-40), 0);
        assert_eq!(state.apply_tension(250), 100);
        assert_eq!(state.apply_tension(40), 40);
    }

    #[test]
    fn test_history_is_fifo_and_fixed_length() {
        let mut state = SessionState::default();
        for t in 0..25 {
            state.apply_tension(t);
            state.push_history();
            assert_eq!(state.history().len(), HISTORY_LEN);
        }
        let history = state.history();
        assert_eq!(history.first(), Some(&5));
        assert_eq!(history.last(), Some(&24));
    }

    #[test]
    fn test_reset_clears_logs() {
        let mut state = SessionState::default();
        state.apply_tension(20);
        state.push_history();
        state.push_message(ChatMessage::user("hi"));
        state.log_decision(AgentDecision::new(1, Agent::Monitor, serde_json::json!({})));
        state.next_turn();

        state.reset();

        assert_eq!(state.tension(), 100);
        assert_eq!(state.history(), vec![100; HISTORY_LEN]);
        assert!(state.messages().is_empty());
        assert!(state.decisions().is_empty());
        assert_eq!(state.turn_count(), 0);
    }

    #[test]
    fn test_set_scenario_uses_its_initial_tension() {
        let mut state = SessionState::default();
        state.set_scenario(Scenario::School);
        assert_eq!(state.tension(), 80);
        assert_eq!(state.history(), vec![80; HISTORY_LEN]);
    }

    #[test]
    fn test_recent_dialogue_skips_system_and_limits() {
        let mut state = SessionState::default();
        state.push_message(ChatMessage::system("notice"));
        for i in 0..4 {
            state.push_message(ChatMessage::user(format!("u{}", i)));
            state.push_message(ChatMessage::ai(format!("a{}", i)));
        }
        let dialogue = state.recent_dialogue(3);
        assert_eq!(dialogue, "AI: a2\nUser: u3\nAI: a3");
    }
}
