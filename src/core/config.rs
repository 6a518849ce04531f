//! Runtime configuration
//!
//! Defaults, overridden by `ECHO_*` environment variables, overridden by
//! CLI flags in `main`.

use std::path::PathBuf;
use std::sync::Arc;
use crate::core::credential::CredentialStore;
use crate::core::gemini::{GeminiClient, GenerativeModel};
use crate::core::prompts::PromptSet;
use crate::types::{Scenario, SimError, SimResult};
use crate::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

pub const ENV_ENDPOINT: &str = "ECHO_ENDPOINT";
pub const ENV_MODEL: &str = "ECHO_MODEL";
pub const ENV_PROMPTS: &str = "ECHO_PROMPTS";
pub const ENV_SCENARIO: &str = "ECHO_SCENARIO";

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub endpoint: String,
    pub model: String,
    pub scenario: Scenario,
    pub prompts: PromptSet,
    /// Resolved credential, `None` if nothing was configured
    pub api_key: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            scenario: Scenario::default(),
            prompts: PromptSet::default(),
            api_key: None,
        }
    }
}

impl SimConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> SimResult<Self> {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            config.model = model;
        }
        if let Ok(scenario) = std::env::var(ENV_SCENARIO) {
            config.scenario = scenario.parse().map_err(SimError::Config)?;
        }
        if let Ok(path) = std::env::var(ENV_PROMPTS) {
            config.prompts = PromptSet::load(PathBuf::from(path))?;
        }
        config.api_key = CredentialStore::default().resolve(None);
        Ok(config)
    }

    /// Gemini client for the configured credential, if there is one
    pub fn build_model(&self) -> Option<Arc<dyn GenerativeModel>> {
        self.model_for(self.api_key.as_deref())
    }

    /// Gemini client for an arbitrary credential
    pub fn model_for(&self, api_key: Option<&str>) -> Option<Arc<dyn GenerativeModel>> {
        let key = api_key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Arc::new(GeminiClient::new(&self.endpoint, &self.model, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_no_model() {
        let config = SimConfig::default();
        assert!(config.build_model().is_none());
        assert!(config.model_for(Some("  ")).is_none());
        assert!(config.model_for(Some("k")).is_some());
    }
}
