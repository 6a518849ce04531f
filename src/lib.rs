//! E.C.H.O.: Empathy & Crisis Handling Operative
//!
//! Crisis negotiation practice against a scripted persona. Each turn runs
//! user text → Monitor (tension) → Director (complication) → Actor (reply).

pub mod core;
pub mod types;

// =============================================================================
// TENSION [C]
// =============================================================================

/// Lowest possible tension
pub const TENSION_MIN: i64 = 0;

/// Highest possible tension
pub const TENSION_MAX: i64 = 100;

/// Tension a fresh session starts at (default scenario)
pub const DEFAULT_TENSION: u8 = 100;

/// Length of the rolling tension history
pub const HISTORY_LEN: usize = 20;

/// Above this the persona is in crisis (red)
pub const TENSION_CRITICAL: u8 = 70;

/// Above this the persona is agitated (amber)
pub const TENSION_ELEVATED: u8 = 30;

/// Resting heart rate; displayed BPM is this plus tension
pub const BASE_HEART_RATE: u16 = 60;

// =============================================================================
// TURN LOOP [C]
// =============================================================================

/// Turns on which the Director injects a complication
pub const DIRECTOR_TURNS: [u32; 2] = [3, 6];

/// Dialogue lines handed to the Actor as context
pub const ACTOR_CONTEXT_LINES: usize = 5;

/// Reasoning recorded when the Monitor reply cannot be parsed
pub const FALLBACK_REASONING: &str = "Error analyzing response";

// =============================================================================
// MODEL ENDPOINT
// =============================================================================

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Key the credential is stored under
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Environment variable consulted for the credential
pub const CREDENTIAL_ENV: &str = "GOOGLE_API_KEY";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
