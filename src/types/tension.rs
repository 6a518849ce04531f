//! Tension bands for display

use serde::{Deserialize, Serialize};
use crate::{BASE_HEART_RATE, TENSION_CRITICAL, TENSION_ELEVATED, TENSION_MAX, TENSION_MIN};

/// Clamp a raw model score into the valid tension range
pub fn clamp_tension(raw: i64) -> u8 {
    raw.clamp(TENSION_MIN, TENSION_MAX) as u8
}

/// Simulated heart rate for a tension level
pub fn heart_rate(tension: u8) -> u16 {
    BASE_HEART_RATE + tension as u16
}

/// How distressed the persona currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TensionBand {
    /// Cooperative, listening
    Calm,
    /// Nervous, skeptical
    Elevated,
    /// Screaming, refusing help
    Critical,
}

impl TensionBand {
    pub fn from_tension(tension: u8) -> Self {
        if tension > TENSION_CRITICAL {
            TensionBand::Critical
        } else if tension > TENSION_ELEVATED {
            TensionBand::Elevated
        } else {
            TensionBand::Calm
        }
    }

    /// Hex color used by the browser front-end
    pub fn hex_color(&self) -> &'static str {
        match self {
            TensionBand::Calm => "#00cc96",
            TensionBand::Elevated => "#f7b731",
            TensionBand::Critical => "#ff2b2b",
        }
    }

    /// Terminal color for this band
    pub fn color(&self) -> colored::Color {
        match self {
            TensionBand::Calm => colored::Color::Green,
            TensionBand::Elevated => colored::Color::Yellow,
            TensionBand::Critical => colored::Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TensionBand::Calm => "🟢",
            TensionBand::Elevated => "🟠",
            TensionBand::Critical => "🔴",
        }
    }
}

impl std::fmt::Display for TensionBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TensionBand::Calm => "CALM",
            TensionBand::Elevated => "ELEVATED",
            TensionBand::Critical => "CRITICAL",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_tension(-15), 0);
        assert_eq!(clamp_tension(140), 100);
        assert_eq!(clamp_tension(42), 42);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(TensionBand::from_tension(71), TensionBand::Critical);
        assert_eq!(TensionBand::from_tension(70), TensionBand::Elevated);
        assert_eq!(TensionBand::from_tension(31), TensionBand::Elevated);
        assert_eq!(TensionBand::from_tension(30), TensionBand::Calm);
    }

    #[test]
    fn test_heart_rate_tracks_tension() {
        assert_eq!(heart_rate(0), 60);
        assert_eq!(heart_rate(100), 160);
    }
}
