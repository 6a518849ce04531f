//! Prompt templates for the three agents
//!
//! Templates use `{name}` placeholders. Unknown placeholders and literal
//! braces (the JSON shape in the Monitor prompt) are left alone.

use std::path::Path;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::types::{Scenario, SimError, SimResult};

lazy_static! {
    static ref RE_PLACEHOLDER: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

const MONITOR_TEMPLATE: &str = r#"You are a psychological monitor analyzing a crisis negotiation.

SCENARIO: {situation}
Current Tension: {tension}/100

User (Responder) said: "{user_input}"

ANALYSIS RULES:
- If user validates feelings ("I understand you're scared") → Decrease tension by 15-20
- If user uses soft tone, empathy, patience → Decrease tension by 10-15
- If user gives orders ("Calm down", "Just relax") → Increase tension by 15-20
- If user uses logic/facts without empathy → Increase tension by 5-10
- If user is dismissive or rude → Increase tension by 25-30

Output ONLY valid JSON (no markdown):
{"new_tension": <number 0-100>, "reasoning": "<brief explanation>", "technique_used": "<validation/logic/dismissal/empathy>"}"#;

const ACTOR_TEMPLATE: &str = r#"{character}

CURRENT STATE:
- Tension Level: {tension}/100
- Complication: {complication}

BEHAVIOR RULES:
- If Tension > 80: SCREAM (use ALL CAPS), stutter, refuse help, interrupt
- If Tension 50-80: Be skeptical, ask fearful questions, voice shaking
- If Tension 30-50: Still nervous but listening, speak softer
- If Tension < 30: Calm, cooperative, grateful

Conversation so far:
{history}

The responder just said: "{user_input}"

Respond as {persona}. Keep it SHORT (1-2 sentences max). ACT the emotion intensely."#;

const DIRECTOR_TEMPLATE: &str = r#"You are the 'Director', controlling the difficulty of a simulation.

SCENARIO: {situation}

Current State:
- Turn Count: {turn}
- Tension: {tension}

Logic:
- On turn 3, inject a minor complication.
- On turn 6, inject a major complication.

Complication Examples:
- "A loud alarm goes off."
- "Another nurse walks in and yells."
- "The lights flicker."

Output just the complication text or "None"."#;

/// The three templates; loadable from JSON so they can be tuned or localized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSet {
    pub monitor: String,
    pub actor: String,
    pub director: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            monitor: MONITOR_TEMPLATE.to_string(),
            actor: ACTOR_TEMPLATE.to_string(),
            director: DIRECTOR_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// Load from a JSON file; missing keys fall back to the built-ins
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        let set: PromptSet = serde_json::from_str(&json)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded prompt set");
        Ok(set)
    }

    pub fn monitor(&self, scenario: Scenario, tension: u8, user_input: &str) -> String {
        render(
            &self.monitor,
            &[
                ("situation", scenario.situation()),
                ("tension", &tension.to_string()),
                ("user_input", user_input),
            ],
        )
    }

    pub fn actor(
        &self,
        scenario: Scenario,
        tension: u8,
        complication: Option<&str>,
        history: &str,
        user_input: &str,
    ) -> String {
        let history = if history.is_empty() { "(none)" } else { history };
        render(
            &self.actor,
            &[
                ("character", scenario.character()),
                ("persona", scenario.persona()),
                ("tension", &tension.to_string()),
                ("complication", complication.unwrap_or("None")),
                ("history", history),
                ("user_input", user_input),
            ],
        )
    }

    pub fn director(&self, scenario: Scenario, turn: u32, tension: u8) -> String {
        render(
            &self.director,
            &[
                ("situation", scenario.situation()),
                ("turn", &turn.to_string()),
                ("tension", &tension.to_string()),
            ],
        )
    }
}

/// Substitute `{key}` for each pair in one pass
///
/// Inserted values are never rescanned, and unknown names stay as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_prompt_fills_values_keeps_json_shape() {
        let p = PromptSet::default().monitor(Scenario::Er, 90, "I can see you're scared");
        assert!(p.contains("Current Tension: 90/100"));
        assert!(p.contains("\"I can see you're scared\""));
        assert!(p.contains("hyperventilating"));
        assert!(p.contains(r#"{"new_tension": <number 0-100>"#));
    }

    #[test]
    fn test_actor_prompt_defaults() {
        let p = PromptSet::default().actor(Scenario::Customer, 95, None, "", "Sorry");
        assert!(p.contains("You are Karen"));
        assert!(p.contains("Complication: None"));
        assert!(p.contains("(none)"));
        assert!(p.contains("Respond as Karen."));
    }

    #[test]
    fn test_render_leaves_inserted_text_alone() {
        let out = render(
            "{history}\nTrainee: {user_input} ({missing})",
            &[("history", "User: type {user_input} here"), ("user_input", "I am here")],
        );
        assert_eq!(out, "User: type {user_input} here\nTrainee: I am here ({missing})");
    }

    #[test]
    fn test_actor_prompt_keeps_braces_in_history() {
        let p = PromptSet::default().actor(
            Scenario::Er,
            90,
            Some("Someone shouts {tension}"),
            "User: type {user_input} here",
            "I am here",
        );
        assert!(p.contains("User: type {user_input} here"));
        assert!(p.contains("Someone shouts {tension}"));
        assert!(p.contains("I am here"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.json");
        std::fs::write(&path, r#"{"director": "Turn {turn}: None"}"#).unwrap();

        let set = PromptSet::load(&path).unwrap();
        assert_eq!(set.director(Scenario::Er, 3, 50), "Turn 3: None");
        assert_eq!(set.monitor, PromptSet::default().monitor);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            PromptSet::load("/definitely/not/here.json"),
            Err(SimError::Config(_))
        ));
    }
}
