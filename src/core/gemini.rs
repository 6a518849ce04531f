//! Gemini `generateContent` client
//!
//! One prompt in, one text out. No retries, no streaming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::types::{SimError, SimResult};

/// Anything that can turn a prompt into text
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> SimResult<String>;
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

const DEFAULT_API_ERROR: &str =
    "API call failed. Check your API key and ensure it has Gemini API access enabled.";

const INVALID_FORMAT: &str = "Invalid API response format";

impl GenerateRequest {
    pub fn single(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// HTTP client for the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// URL without the key, safe to log
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> SimResult<String> {
        debug!(url = %self.url(), prompt_len = prompt.len(), "calling model");

        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::single(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| DEFAULT_API_ERROR.to_string());
            warn!(%status, %message, "model call rejected");
            return Err(SimError::Api(message));
        }

        serde_json::from_str::<GenerateResponse>(&body)
            .ok()
            .and_then(GenerateResponse::first_text)
            .ok_or_else(|| SimError::Api(INVALID_FORMAT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(GenerateRequest::single("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]}));
    }

    #[test]
    fn test_first_text() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "I'M SCARED"}], "role": "model"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("I'M SCARED"));
    }

    #[test]
    fn test_first_text_missing() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(resp.first_text().is_none());
        let resp: GenerateResponse = serde_json::from_str(r#"{"candidates": [{}]}"#).unwrap();
        assert!(resp.first_text().is_none());
    }

    #[test]
    fn test_url_trims_slash() {
        let client = GeminiClient::new("http://localhost:9/v1beta/", "gemini-pro", "k");
        assert_eq!(client.url(), "http://localhost:9/v1beta/models/gemini-pro:generateContent");
    }
}
