//! Generative model backends.
//!
//! [`OllamaGenerator`] calls `/api/generate` with streaming off;
//! [`OpenAiGenerator`] calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint with the prompt as a single user message. Both return the
//! model's text unmodified. The request timeout lives in the orchestrator.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use dev_documento_core::generation::Generator;
use dev_documento_core::RagError;

use crate::config::LlmConfig;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

fn model_failure(err: impl std::fmt::Display) -> RagError {
    RagError::ModelFailure(err.to_string())
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config
                .url
                .as_deref()
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String, RagError> {
        let req = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| OllamaOptions { temperature }),
        };

        let resp = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                model_failure(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(model_failure(format!(
                "Ollama generate API returned {}: {}",
                status, body
            )));
        }

        let body: OllamaGenerateResponse = resp.json().await.map_err(model_failure)?;
        Ok(body.response)
    }
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

/// Chat-completions client. `OPENAI_API_KEY` is sent when set, so local
/// OpenAI-compatible servers work without one.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config
                .url
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String, RagError> {
        let req = OpenAiChatRequest {
            model: &self.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.url))
            .json(&req);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| model_failure(format!("chat completions request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(model_failure(format!(
                "chat completions API returned {}: {}",
                status, body
            )));
        }

        let body: OpenAiChatResponse = resp.json().await.map_err(model_failure)?;
        first_choice(body)
    }
}

fn first_choice(body: OpenAiChatResponse) -> Result<String, RagError> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| model_failure("chat completions response had no choices"))
}

/// Build the [`Generator`] named by `config.provider`.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config))),
        "openai" => Ok(Arc::new(OpenAiGenerator::new(config))),
        other => bail!("Unknown LLM provider: {}", other),
    }
}
