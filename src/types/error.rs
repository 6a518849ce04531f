//! Error type for the simulator

use thiserror::Error;

/// Everything that can go wrong during a turn or around it
#[derive(Debug, Error)]
pub enum SimError {
    /// Submitted text was blank
    #[error("Please enter a message")]
    EmptyInput,
    /// No API key configured
    #[error("Please configure your API key first")]
    MissingCredential,
    /// Another turn has not finished yet
    #[error("A turn is already in progress")]
    TurnInFlight,
    /// Transport failure talking to the model
    #[error("network error: {0}")]
    Network(String),
    /// Model endpoint answered with an error or an unusable body
    #[error("{0}")]
    Api(String),
    /// Model text was not the expected JSON payload
    #[error("parse error: {0}")]
    Parse(String),
    /// Credential or prompt file could not be read or written
    #[error("storage error: {0}")]
    Storage(String),
    /// Bad configuration value
    #[error("config error: {0}")]
    Config(String),
    /// Background turn task was cancelled before finishing
    #[error("turn interrupted: {0}")]
    Interrupted(String),
}

impl SimError {
    /// Turn failures as opposed to rejected preconditions
    pub fn is_upstream(&self) -> bool {
        matches!(self, SimError::Network(_) | SimError::Api(_) | SimError::Parse(_))
    }
}

impl From<reqwest::Error> for SimError {
    fn from(e: reqwest::Error) -> Self {
        SimError::Network(e.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Storage(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
