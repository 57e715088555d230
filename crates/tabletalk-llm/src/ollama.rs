//! Ollama API client
//!
//! Talks to a local Ollama server over its REST API. Generation uses
//! `/api/generate` with streaming disabled; health checks hit
//! `/api/tags`. Temperature 0 and a fixed seed keep output reproducible,
//! which matters when a repair prompt needs the model to change its
//! answer for a reason other than sampling noise.

use crate::model::{LanguageModel, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabletalk_core::LlmConfig;

/// Client for a single Ollama model
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    seed: u32,
    num_predict: u32,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    seed: u32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a client with deterministic defaults: temperature 0,
    /// seed 42, 2048 token budget, 120 second timeout.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.0,
            seed: 42,
            num_predict: 2048,
            timeout: Duration::from_secs(120),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.base_url, &config.model)
            .with_temperature(config.temperature)
            .with_seed(config.seed)
            .with_num_predict(config.num_predict)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_predict(mut self, num_predict: u32) -> Self {
        self.num_predict = num_predict;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl LanguageModel for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                seed: self.seed,
                num_predict: self.num_predict,
            },
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Ollama reports an unpulled model as a 404 with the name in
            // the body.
            if status.as_u16() == 404 && body.contains("not found") {
                return Err(LlmError::ModelMissing(self.model.clone()));
            }
            return Err(LlmError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(format!("Invalid response body: {}", e)))?;

        if parsed.response.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LlmError::BadStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3:8b");
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3:8b");
        assert_eq!(client.temperature, 0.0);
        assert_eq!(client.seed, 42);
        assert_eq!(client.num_predict, 2048);
    }

    #[test]
    fn test_from_config_carries_every_knob() {
        let config = LlmConfig {
            base_url: "http://models.internal:11434".to_string(),
            model: "sqlcoder".to_string(),
            temperature: 0.2,
            seed: 7,
            num_predict: 512,
            timeout_secs: 30,
        };
        let client = OllamaClient::from_config(&config);
        assert_eq!(client.base_url(), "http://models.internal:11434");
        assert_eq!(client.model(), "sqlcoder");
        assert_eq!(client.temperature, 0.2);
        assert_eq!(client.seed, 7);
        assert_eq!(client.num_predict, 512);
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            model: "llama3:8b",
            prompt: "SELECT",
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                seed: 42,
                num_predict: 2048,
            },
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "llama3:8b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["seed"], 42);
        assert_eq!(body["options"]["num_predict"], 2048);
    }
}
