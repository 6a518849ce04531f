//! Turn Controller: one user message → Monitor → Director → Actor
//!
//! Calls are strictly sequential; each depends on the previous result.
//! Session state lives behind a std Mutex that is never held across an
//! await, and a separate in-flight flag rejects overlapping turns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use crate::core::decision::parse_decision;
use crate::core::gemini::GenerativeModel;
use crate::core::prompts::PromptSet;
use crate::core::session::{SessionSnapshot, SessionState};
use crate::types::{
    Agent, AgentDecision, ChatMessage, PerformanceReport, Scenario, SimError, SimResult,
    TurnOutcome,
};
use crate::{ACTOR_CONTEXT_LINES, DIRECTOR_TURNS, FALLBACK_REASONING};

/// Set while a turn is running; cleared when the permit drops
#[derive(Debug, Clone, Default)]
pub struct TurnGate(Arc<AtomicBool>);

/// Proof that the holder owns the current turn
#[derive(Debug)]
pub struct TurnPermit(Arc<AtomicBool>);

impl TurnGate {
    pub fn try_begin(&self) -> Option<TurnPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TurnPermit(self.0.clone()))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives a session turn by turn
pub struct TurnController {
    state: Mutex<SessionState>,
    prompts: PromptSet,
    model: Option<Arc<dyn GenerativeModel>>,
    gate: TurnGate,
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("state", &self.state)
            .field("has_model", &self.model.is_some())
            .field("busy", &self.gate.is_busy())
            .finish()
    }
}

impl TurnController {
    /// `model` is `None` when no credential is configured
    pub fn new(scenario: Scenario, prompts: PromptSet, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self {
            state: Mutex::new(SessionState::new(scenario)),
            prompts,
            model,
            gate: TurnGate::default(),
        }
    }

    /// Swap in a model, e.g. after the credential was entered
    pub fn set_model(&mut self, model: Arc<dyn GenerativeModel>) {
        self.model = Some(model);
    }

    /// Drop the model; turns are refused until a new one is set
    pub fn clear_model(&mut self) {
        self.model = None;
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one full turn
    ///
    /// Empty input, a missing credential or a turn already in flight are
    /// rejected before anything is touched. Upstream failures leave a
    /// `system` entry in the message log and are returned.
    pub async fn submit(&self, text: &str) -> SimResult<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SimError::EmptyInput);
        }
        let model = self.model.clone().ok_or(SimError::MissingCredential)?;
        let _permit = self.gate.try_begin().ok_or(SimError::TurnInFlight)?;

        let (turn, scenario, tension_before, dialogue) = {
            let mut state = self.lock();
            let dialogue = state.recent_dialogue(ACTOR_CONTEXT_LINES);
            state.push_message(ChatMessage::user(text));
            let turn = state.next_turn();
            (turn, state.scenario(), state.tension(), dialogue)
        };
        debug!(turn, tension = tension_before, "turn started");

        // Monitor
        let raw = self
            .call(&*model, &self.prompts.monitor(scenario, tension_before, text))
            .await?;

        let (decision, reasoning, tension) = {
            let mut state = self.lock();
            let (decision, reasoning) = match parse_decision(&raw) {
                Ok(decision) => {
                    state.apply_tension(decision.new_tension);
                    let reasoning = decision.reasoning.clone();
                    state.log_decision(AgentDecision::new(
                        turn,
                        Agent::Monitor,
                        serde_json::to_value(&decision).unwrap_or_default(),
                    ));
                    (Some(decision), reasoning)
                }
                Err(e) => {
                    warn!(turn, error = %e, "monitor reply unparsable, tension unchanged");
                    state.log_decision(AgentDecision::new(
                        turn,
                        Agent::Monitor,
                        serde_json::json!({ "reasoning": FALLBACK_REASONING }),
                    ));
                    (None, FALLBACK_REASONING.to_string())
                }
            };
            state.push_history();
            (decision, reasoning, state.tension())
        };

        // Director
        let complication = if DIRECTOR_TURNS.contains(&turn) {
            self.direct(&*model, scenario, turn, tension).await
        } else {
            None
        };

        // Actor
        let reply = self
            .call(
                &*model,
                &self
                    .prompts
                    .actor(scenario, tension, complication.as_deref(), &dialogue, text),
            )
            .await?;
        let reply = reply.trim().to_string();

        self.lock().push_message(ChatMessage::ai(reply.clone()));

        let outcome = TurnOutcome::new(
            turn,
            tension_before,
            tension,
            decision,
            reasoning,
            complication,
            reply,
        );
        info!(
            turn,
            tension_before,
            tension,
            complication = outcome.complication.as_deref().unwrap_or("none"),
            "turn complete"
        );
        Ok(outcome)
    }

    /// Run the turn on its own task so dropping the caller cannot cut it short
    ///
    /// The returned future may be abandoned (a client hanging up on the HTTP
    /// API); the turn still finishes and leaves either the `ai` reply or the
    /// `system` error entry in the log.
    pub async fn submit_detached(self: &Arc<Self>, text: &str) -> SimResult<TurnOutcome> {
        let ctl = Arc::clone(self);
        let text = text.to_string();
        match tokio::spawn(async move { ctl.submit(&text).await }).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(SimError::Interrupted(e.to_string())),
        }
    }

    /// Model call that records failures as a visible system entry
    async fn call(&self, model: &dyn GenerativeModel, prompt: &str) -> SimResult<String> {
        match model.generate(prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(error = %e, "model call failed");
                self.lock()
                    .push_message(ChatMessage::system(format!("Error: {}", e)));
                Err(e)
            }
        }
    }

    /// Ask the Director for a complication; failures just skip it
    async fn direct(
        &self,
        model: &dyn GenerativeModel,
        scenario: Scenario,
        turn: u32,
        tension: u8,
    ) -> Option<String> {
        let raw = match model
            .generate(&self.prompts.director(scenario, turn, tension))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(turn, error = %e, "director call failed, no complication");
                return None;
            }
        };

        let text = raw.trim().trim_matches('"').trim();
        let complication = if text.is_empty() || text.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(text.to_string())
        };

        self.lock().log_decision(AgentDecision::new(
            turn,
            Agent::Director,
            serde_json::json!({ "complication": complication.as_deref().unwrap_or("None") }),
        ));
        complication
    }

    /// Restart the current scenario; refused mid-turn
    pub fn reset(&self) -> SimResult<()> {
        let _permit = self.gate.try_begin().ok_or(SimError::TurnInFlight)?;
        let mut state = self.lock();
        state.reset();
        info!(scenario = state.scenario().key(), "session reset");
        Ok(())
    }

    /// Switch scenario, starting over
    pub fn set_scenario(&self, scenario: Scenario) -> SimResult<()> {
        let _permit = self.gate.try_begin().ok_or(SimError::TurnInFlight)?;
        let mut state = self.lock();
        state.set_scenario(scenario);
        info!(scenario = scenario.key(), "scenario changed");
        Ok(())
    }

    /// `None` until the trainee and persona have exchanged something
    pub fn report(&self) -> Option<PerformanceReport> {
        let state = self.lock();
        if !state.has_exchanges() {
            return None;
        }
        Some(PerformanceReport::new(
            state.tension(),
            &state.history(),
            state.turn_count(),
        ))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages().to_vec()
    }

    pub fn decisions(&self) -> Vec<AgentDecision> {
        self.lock().decisions().to_vec()
    }

    pub fn scenario(&self) -> Scenario {
        self.lock().scenario()
    }

    pub fn tension(&self) -> u8 {
        self.lock().tension()
    }
}

// =============================================================================
// TESTS
// =============================================================================
