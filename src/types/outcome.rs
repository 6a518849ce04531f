//! Output structures for terminal display

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use colored::Colorize;
use crate::types::{heart_rate, DecisionPayload, TensionBand};

/// Everything one completed turn produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// 1-based turn number
    pub turn: u32,
    /// Tension before the Monitor ran
    pub tension_before: u8,
    /// Tension after the update
    pub tension: u8,
    /// Simulated BPM
    pub heart_rate: u16,
    pub band: TensionBand,
    /// Parsed Monitor decision, `None` if the reply was malformed
    pub decision: Option<DecisionPayload>,
    /// Reasoning shown to the trainee (fallback text when unparsed)
    pub reasoning: String,
    /// Director complication, if one was injected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complication: Option<String>,
    /// Persona's reply
    pub reply: String,
}

impl TurnOutcome {
    pub fn new(
        turn: u32,
        tension_before: u8,
        tension: u8,
        decision: Option<DecisionPayload>,
        reasoning: String,
        complication: Option<String>,
        reply: String,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            turn,
            tension_before,
            tension,
            heart_rate: heart_rate(tension),
            band: TensionBand::from_tension(tension),
            decision,
            reasoning,
            complication,
            reply,
        }
    }

    /// Signed tension change this turn
    pub fn delta(&self) -> i16 {
        self.tension as i16 - self.tension_before as i16
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} tension={} ({:+}) | 💓 {} BPM | {}",
            self.band.emoji(),
            self.tension,
            self.delta(),
            self.heart_rate,
            self.band
        );
        line.color(self.band.color()).to_string()
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "turn={} | tension={} | delta={:+} | bpm={} | band={}",
            self.turn,
            self.tension,
            self.delta(),
            self.heart_rate,
            self.band
        )
    }
}
