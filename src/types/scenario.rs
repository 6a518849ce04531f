//! Scenario catalog

use serde::{Deserialize, Serialize};

/// A practice scenario: who the persona is and how upset they start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Sarah, ER patient terrified of needles
    #[default]
    Er,
    /// Alex, bullying victim hiding in the bathroom
    School,
    /// Karen, customer whose flight was cancelled
    Customer,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Er, Scenario::School, Scenario::Customer];

    pub fn key(&self) -> &'static str {
        match self {
            Scenario::Er => "er",
            Scenario::School => "school",
            Scenario::Customer => "customer",
        }
    }

    /// Persona's first name, used as the chat label
    pub fn persona(&self) -> &'static str {
        match self {
            Scenario::Er => "Sarah",
            Scenario::School => "Alex",
            Scenario::Customer => "Karen",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Scenario::Er => "ER Patient (Sarah)",
            Scenario::School => "Bullying Victim (Alex)",
            Scenario::Customer => "Angry Customer (Karen)",
        }
    }

    /// One-line brief shown to the trainee
    pub fn brief(&self) -> &'static str {
        match self {
            Scenario::Er => "Sarah, 24, is terrified of needles and refusing IV medication.",
            Scenario::School => "Alex is hiding in the bathroom, afraid to go to class.",
            Scenario::Customer => "Karen is furious about a cancelled flight and missing a wedding.",
        }
    }

    /// Situation line given to the Monitor
    pub fn situation(&self) -> &'static str {
        match self {
            Scenario::Er => "Sarah is a 24-year-old ER patient, terrified of needles, hyperventilating.",
            Scenario::School => "Alex is a student being bullied, hiding in a school bathroom, refusing to come out.",
            Scenario::Customer => "Karen is an airline customer whose flight was cancelled; she is missing her daughter's wedding.",
        }
    }

    /// Character sheet given to the Actor
    pub fn character(&self) -> &'static str {
        match self {
            Scenario::Er => "You are Sarah, a 24-year-old patient in the ER. You are TERRIFIED of needles.\n\
                - Physical: Hyperventilating, shaking, sweating\n\
                - Mental: Convinced the medicine is poison, paranoid",
            Scenario::School => "You are Alex, a student who is being bullied.\n\
                - Context: You are hiding in the bathroom. You are afraid to go to class.\n\
                - Behavior: Whisper. Cry. Refuse to open the door unless you feel safe.",
            Scenario::Customer => "You are Karen, a furious customer whose flight was cancelled.\n\
                - Context: You are missing your daughter's wedding.\n\
                - Behavior: Yell. Demand a manager. Insult the user. Calm down if offered a solution AND empathy.",
        }
    }

    pub fn initial_tension(&self) -> u8 {
        match self {
            Scenario::Er => crate::DEFAULT_TENSION,
            Scenario::School => 80,
            Scenario::Customer => 95,
        }
    }

    /// Opening notice for a fresh session
    pub fn opening_notice(&self) -> String {
        format!(
            "🎯 Simulation started. {} is in extreme distress. Use empathy to de-escalate.",
            self.persona()
        )
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scenario '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_er_at_full_tension() {
        assert_eq!(Scenario::default(), Scenario::Er);
        assert_eq!(Scenario::default().initial_tension(), 100);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("School".parse::<Scenario>().unwrap(), Scenario::School);
        assert_eq!(" customer ".parse::<Scenario>().unwrap(), Scenario::Customer);
        assert!("mars".parse::<Scenario>().is_err());
    }
}
