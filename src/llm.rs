//! Inference gateway: the opaque text-generation collaborator.
//!
//! The pipeline treats generation as a pure function of the prompt text.
//! Decoding policy, weights and adapter composition are the backend's
//! business; nothing here retries, and latency bounds are owned by the
//! orchestrator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{PipelineError, Result};

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// HTTP client for an OpenAI-compatible `/completions` endpoint (vLLM,
/// llama.cpp server, or any equivalent). Requests greedy decoding
/// (temperature 0.0) so generation is deterministic up to the backend's
/// own policy.
pub struct HttpInferenceClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpInferenceClient {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceClient {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": max_new_tokens,
            "temperature": 0.0,
        });

        let mut request = self
            .client
            .post(format!("{}/completions", self.base_url))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Inference(format!("inference request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(PipelineError::Inference(format!(
                "inference backend returned {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            PipelineError::Inference(format!("malformed inference response: {}", e))
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            PipelineError::Inference("no choices in inference response".to_string())
        })?;

        debug!(chars = choice.text.len(), "inference completed");
        Ok(choice.text)
    }
}

/// Gateway that generates nothing. Lets a deployment come up without a
/// model behind it (`LLM_STUB=1`); every ask then fails at execution and
/// is reported through the normal error payload.
pub struct NullGateway;

#[async_trait]
impl InferenceGateway for NullGateway {
    async fn generate(&self, _prompt: &str, _max_new_tokens: u32) -> Result<String> {
        Ok(String::new())
    }
}

/// Deterministic in-process gateway that replays scripted responses in
/// order. Records every prompt it sees so tests can assert on call counts
/// and prompt contents.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generate() calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn generate(&self, prompt: &str, _max_new_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PipelineError::Inference("scripted gateway exhausted".to_string()))
    }
}

/// Build the gateway a deployment configured: the HTTP client, or the
/// null stub when `LLM_STUB` is set.
pub fn gateway_from_config(config: &Config) -> Arc<dyn InferenceGateway> {
    if config.llm_stub {
        Arc::new(NullGateway)
    } else {
        Arc::new(HttpInferenceClient::new(
            config.inference_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
        ))
    }
}
