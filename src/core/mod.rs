//! Core modules for E.C.H.O.

pub mod session;
pub mod decision;
pub mod prompts;
pub mod gemini;
pub mod controller;
pub mod credential;
pub mod config;
pub mod api;

pub use session::{SessionState, SessionSnapshot};
pub use decision::{parse_decision, strip_fences};
pub use prompts::PromptSet;
pub use gemini::{GeminiClient, GenerativeModel};
pub use controller::{TurnController, TurnGate, TurnPermit};
pub use credential::CredentialStore;
pub use config::SimConfig;
pub use api::{create_router, router_with_state, run_server, AppState, TensionUpdate};
