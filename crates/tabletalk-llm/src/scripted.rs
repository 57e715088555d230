//! Scripted model for testing
//!
//! Returns queued responses in order and records every prompt it was
//! given, so tests can assert both what the pipeline asked and how it
//! handled each answer.

use crate::model::{LanguageModel, LlmError};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Test double that replays a fixed script of responses
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    healthy: bool,
}

impl ScriptedModel {
    /// Create a model that answers with the given responses, in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    /// Create a model that always gives the same single answer first,
    /// then reports itself empty.
    pub fn single(response: impl Into<String>) -> Self {
        Self::new([response.into()])
    }

    /// Create a model whose health check fails.
    pub fn unhealthy() -> Self {
        let mut model = Self::new(Vec::<String>::new());
        model.healthy = false;
        model
    }

    /// Every prompt received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Number of scripted responses not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.healthy {
            Ok(())
        } else {
            Err(LlmError::RequestFailed("scripted outage".to_string()))
        }
    }
}
