//! End-of-session performance report

use serde::{Deserialize, Serialize};

/// Score above which the trainee kept things calm
pub const SCORE_EXCELLENT: u8 = 80;

/// Score above which the effort counts as decent
pub const SCORE_GOOD: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Excellent,
    Good,
    Escalated,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score > SCORE_EXCELLENT {
            Verdict::Excellent
        } else if score > SCORE_GOOD {
            Verdict::Good
        } else {
            Verdict::Escalated
        }
    }

    pub fn feedback(&self) -> &'static str {
        match self {
            Verdict::Excellent => "🌟 Excellent work! You kept the situation calm.",
            Verdict::Good => "⚠️ Good effort, but try to validate feelings more.",
            Verdict::Escalated => "🚨 The situation escalated. Try to listen more actively.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// `100 - final tension`
    pub score: u8,
    /// Mean over the rolling history buffer
    pub average_tension: f64,
    pub final_tension: u8,
    pub turns: u32,
    pub verdict: Verdict,
}

impl PerformanceReport {
    pub fn new(final_tension: u8, history: &[u8], turns: u32) -> Self {
        let score = 100u8.saturating_sub(final_tension);
        let average_tension = if history.is_empty() {
            final_tension as f64
        } else {
            history.iter().map(|&t| t as f64).sum::<f64>() / history.len() as f64
        };
        Self {
            score,
            average_tension,
            final_tension,
            turns,
            verdict: Verdict::from_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_inverse_of_final_tension() {
        let report = PerformanceReport::new(15, &[100, 60, 15], 2);
        assert_eq!(report.score, 85);
        assert_eq!(report.verdict, Verdict::Excellent);
        assert!((report.average_tension - 58.333).abs() < 0.01);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_score(81), Verdict::Excellent);
        assert_eq!(Verdict::from_score(80), Verdict::Good);
        assert_eq!(Verdict::from_score(51), Verdict::Good);
        assert_eq!(Verdict::from_score(50), Verdict::Escalated);
    }
}
