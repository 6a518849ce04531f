//! Decision parser: turns Monitor text into a DecisionPayload
//!
//! Models like to wrap JSON in markdown fences or a sentence of prose, so
//! fences are stripped first and, failing that, the outermost `{...}` block
//! is tried.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use crate::types::{DecisionPayload, SimError, SimResult};

lazy_static! {
    static ref RE_FENCE: Regex = Regex::new(r"```(?:json|JSON)?").unwrap();

    static ref RE_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Parse raw Monitor output
pub fn parse_decision(raw: &str) -> SimResult<DecisionPayload> {
    let clean = strip_fences(raw);

    let value: Value = match serde_json::from_str(&clean) {
        Ok(v) => v,
        Err(first) => {
            let block = RE_OBJECT
                .find(&clean)
                .ok_or_else(|| SimError::Parse(first.to_string()))?;
            serde_json::from_str(block.as_str()).map_err(|e| SimError::Parse(e.to_string()))?
        }
    };

    decode(&value)
}

/// Remove ```json / ``` markers and surrounding whitespace
pub fn strip_fences(raw: &str) -> String {
    RE_FENCE.replace_all(raw, "").trim().to_string()
}

fn decode(value: &Value) -> SimResult<DecisionPayload> {
    let Value::Object(map) = value else {
        return Err(SimError::Parse("decision must be a JSON object".to_string()));
    };

    let new_tension = match map.get("new_tension") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(finite_round))
            .ok_or_else(|| SimError::Parse("new_tension out of range".to_string()))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(finite_round)
            .ok_or_else(|| SimError::Parse(format!("new_tension is not a number: {}", s)))?,
        Some(other) => {
            return Err(SimError::Parse(format!("new_tension is not a number: {}", other)))
        }
        None => return Err(SimError::Parse("missing new_tension".to_string())),
    };

    let reasoning = map
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let technique_used = map
        .get("technique_used")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(DecisionPayload {
        new_tension,
        reasoning,
        technique_used,
    })
}

/// NaN and infinities are rejected rather than saturated
fn finite_round(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.round() as i64)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let d = parse_decision(
            r#"{"new_tension": 40, "reasoning": "validated fear", "technique_used": "validation"}"#,
        )
        .unwrap();
        assert_eq!(d.new_tension, 40);
        assert_eq!(d.reasoning, "validated fear");
        assert_eq!(d.technique_used.as_deref(), Some("validation"));
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"new_tension\": 85, \"reasoning\": \"gave orders\"}\n```";
        let d = parse_decision(raw).unwrap();
        assert_eq!(d.new_tension, 85);
        assert_eq!(d.technique_used, None);
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Sure! Here is the analysis: {\"new_tension\": 55.6, \"reasoning\": \"ok\"} Hope that helps.";
        let d = parse_decision(raw).unwrap();
        assert_eq!(d.new_tension, 56);
    }

    #[test]
    fn test_out_of_range_passes_through_unclamped() {
        let d = parse_decision(r#"{"new_tension": 130}"#).unwrap();
        assert_eq!(d.new_tension, 130);
    }

    #[test]
    fn test_string_number() {
        let d = parse_decision(r#"{"new_tension": " 70 "}"#).unwrap();
        assert_eq!(d.new_tension, 70);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse_decision("She seems calmer."), Err(SimError::Parse(_))));
        assert!(matches!(parse_decision(r#"{"reasoning": "x"}"#), Err(SimError::Parse(_))));
        assert!(matches!(parse_decision("[1, 2]"), Err(SimError::Parse(_))));
        assert!(matches!(parse_decision(r#"{"new_tension": true}"#), Err(SimError::Parse(_))));
    }

    #[test]
    fn test_non_finite_string_rejected() {
        for raw in [
            r#"{"new_tension": "NaN"}"#,
            r#"{"new_tension": "inf"}"#,
            r#"{"new_tension": "-inf"}"#,
            r#"{"new_tension": "1e400"}"#,
        ] {
            assert!(matches!(parse_decision(raw), Err(SimError::Parse(_))), "{}", raw);
        }
    }
}
