//! OpenRouter chat-completions client.
//!
//! One round trip to `POST {base}/chat/completions` with the OpenAI-style
//! request shape OpenRouter accepts. No retries, no streaming, no timeout
//! beyond the HTTP client's default — failures surface the upstream status
//! and body.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::OpenRouterConfig;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Token accounting as reported by the upstream model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The pieces of a completion the CLI envelope needs.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Model identifier as echoed by OpenRouter (may differ from the request).
    pub model: String,
    pub text: String,
    pub usage: Usage,
}

pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, config: &OpenRouterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: OPENROUTER_API_BASE.to_string(),
            api_key,
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }

    /// Send one user message and return the generated text plus usage counts.
    pub async fn chat(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<ChatCompletion> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            // Optional OpenRouter analytics headers
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenRouter API error {}: {}", status, body);
        }

        let parsed: ChatResponse = response.json().await?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenRouter response contained no choices"))?;

        Ok(ChatCompletion {
            model: parsed.model,
            text: choice.message.content,
            usage: parsed.usage.unwrap_or_default(),
        })
    }
}
