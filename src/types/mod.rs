//! Core types for E.C.H.O.

mod tension;
mod message;
mod decision;
mod scenario;
mod outcome;
mod report;
mod error;

pub use tension::{TensionBand, clamp_tension, heart_rate};
pub use message::{ChatMessage, Role};
pub use decision::{Agent, AgentDecision, DecisionPayload};
pub use scenario::Scenario;
pub use outcome::TurnOutcome;
pub use report::{PerformanceReport, Verdict, SCORE_EXCELLENT, SCORE_GOOD};
pub use error::{SimError, SimResult};
