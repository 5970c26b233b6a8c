//! Thin client for an OpenAI-compatible chat completion API.
//!
//! - `POST {endpoint}/v1/chat/completions` — non-streaming chat completion.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::{AdaptersError, Result, make_snippet, validate_http_endpoint};
use crate::provider_config::{LlmModelConfig, LlmProvider};

/// Thin client bound to a single [`LlmModelConfig`] with `provider = OpenAi`.
#[derive(Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiClient {
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::OpenAi {
            return Err(AdaptersError::UnsupportedProvider(format!(
                "{:?} (expected OpenAi)",
                cfg.provider
            )));
        }
        let api_key = cfg
            .api_key
            .clone()
            .ok_or(AdaptersError::MissingVar("OPENAI_API_KEY"))?;
        validate_http_endpoint("endpoint", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| AdaptersError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/v1/chat/completions");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "OpenAiClient initialized"
        );

        Ok(Self { http, cfg, url_chat })
    }

    pub fn endpoint(&self) -> &str {
        &self.cfg.endpoint
    }

    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let started = Instant::now();
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages,
            temperature: self.cfg.temperature,
            top_p: self.cfg.top_p,
            max_tokens: self.cfg.max_tokens,
        };

        debug!("POST {}", self.url_chat);
        let resp = self
            .http
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdaptersError::Timeout(self.url_chat.clone())
                } else {
                    AdaptersError::from(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(%status, %url, %snippet, latency_ms = started.elapsed().as_millis(), "chat completion returned non-success status");
            return Err(AdaptersError::HttpStatus { status, url, snippet });
        }

        let out: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| AdaptersError::Decode(e.to_string()))?;

        let text = out
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AdaptersError::EmptyOutput);
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}
