//! Integration tests for the turn loop
//!
//! Tests the full path: text → GeminiClient (HTTP) → TurnController → state

mod common;

use std::sync::Arc;
use echo_sim::core::{GeminiClient, GenerativeModel, PromptSet, TurnController};
use echo_sim::types::{Agent, Role, Scenario, SimError, TensionBand};
use echo_sim::{FALLBACK_REASONING, HISTORY_LEN};
use pretty_assertions::assert_eq;

fn controller(endpoint: &str, model: &str, key: &str) -> TurnController {
    let client: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(endpoint, model, key));
    TurnController::new(Scenario::Er, PromptSet::default(), Some(client))
}

/// Test a full turn over HTTP
#[tokio::test]
async fn test_full_turn_over_http() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "gemini-pro", common::GOOD_KEY);

    let outcome = ctl.submit("I can see you're really scared. That makes sense.").await.unwrap();

    assert_eq!(outcome.turn, 1);
    assert_eq!(outcome.tension_before, 100);
    assert_eq!(outcome.tension, 40);
    assert_eq!(outcome.heart_rate, 100);
    assert_eq!(outcome.band, TensionBand::Elevated);
    assert_eq!(outcome.reply, common::ACTOR_REPLY);
    assert_eq!(outcome.reasoning, "validated her fear");
    assert_eq!(
        outcome.decision.as_ref().and_then(|d| d.technique_used.as_deref()),
        Some("validation")
    );

    let snap = ctl.snapshot();
    assert_eq!(snap.history.len(), HISTORY_LEN);
    assert_eq!(snap.history.last(), Some(&40));
    assert_eq!(snap.history[HISTORY_LEN - 2], 100);
}

/// Director fires on turn 3 only
#[tokio::test]
async fn test_director_complication_on_third_turn() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "gemini-pro", common::GOOD_KEY);

    for text in ["Hi Sarah.", "I'm right here."] {
        let outcome = ctl.submit(text).await.unwrap();
        assert!(outcome.complication.is_none());
    }
    let third = ctl.submit("Take your time.").await.unwrap();
    assert_eq!(third.complication.as_deref(), Some(common::COMPLICATION));

    let agents: Vec<Agent> = ctl.decisions().iter().map(|d| d.agent).collect();
    assert_eq!(
        agents,
        vec![Agent::Monitor, Agent::Monitor, Agent::Monitor, Agent::Director]
    );
}

/// Unparsable Monitor reply leaves tension alone but the turn completes
#[tokio::test]
async fn test_unparsable_monitor_reply() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "gemini-pro", common::GOOD_KEY);

    let outcome = ctl.submit("gibberish").await.unwrap();

    assert_eq!(outcome.tension, 100);
    assert!(outcome.decision.is_none());
    assert_eq!(outcome.reasoning, FALLBACK_REASONING);
    assert_eq!(outcome.reply, common::ACTOR_REPLY);
}

/// Rejected key surfaces the API's own message as a system entry
#[tokio::test]
async fn test_bad_key_is_reported_not_fatal() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "gemini-pro", "wrong");

    let err = ctl.submit("Hello?").await.unwrap_err();
    match err {
        SimError::Api(ref message) => assert!(message.contains("API key not valid")),
        other => panic!("expected Api error, got {:?}", other),
    }

    let last = ctl.messages().pop().unwrap();
    assert_eq!(last.role, Role::System);
    assert!(last.text.starts_with("Error: API key not valid"));
    assert_eq!(ctl.tension(), 100);

    // Still usable afterwards
    assert!(!ctl.is_busy());
}

/// Response without candidates is an invalid format error
#[tokio::test]
async fn test_invalid_response_format() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "broken", common::GOOD_KEY);

    let err = ctl.submit("Hello?").await.unwrap_err();
    assert!(matches!(err, SimError::Api(ref m) if m == "Invalid API response format"));
}

/// Unreachable endpoint is a network error
#[tokio::test]
async fn test_network_failure() {
    let ctl = controller("http://127.0.0.1:9/v1beta", "gemini-pro", common::GOOD_KEY);

    let err = ctl.submit("Hello?").await.unwrap_err();
    assert!(matches!(err, SimError::Network(_)));
    assert_eq!(ctl.messages().last().map(|m| m.role), Some(Role::System));
}

/// Tension stays clamped and history bounded over many turns
#[tokio::test]
async fn test_many_turns_keep_invariants() {
    let endpoint = common::spawn_fake_gemini().await;
    let ctl = controller(&endpoint, "gemini-pro", common::GOOD_KEY);

    for i in 0..25 {
        let outcome = ctl.submit(&format!("message {}", i)).await.unwrap();
        assert!(outcome.tension <= 100);
        assert_eq!(ctl.snapshot().history.len(), HISTORY_LEN);
    }
    assert_eq!(ctl.snapshot().history, vec![40; HISTORY_LEN]);
}
