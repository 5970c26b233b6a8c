//! Thin client for the local Ollama API.
//!
//! - `POST {endpoint}/api/generate` — synchronous text generation (`stream=false`)
//! - `GET  {endpoint}/api/tags`     — used by the health probe, see [`crate::health`]

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{AdaptersError, Result, make_snippet, validate_http_endpoint};
use crate::provider_config::{LlmModelConfig, LlmProvider};

/// Thin client bound to a single [`LlmModelConfig`] with `provider = Ollama`.
pub struct OllamaClient {
    http: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl OllamaClient {
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(AdaptersError::UnsupportedProvider(format!(
                "{:?} (expected Ollama)",
                cfg.provider
            )));
        }
        validate_http_endpoint("endpoint", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let base = cfg.endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{base}/api/generate");

        Ok(Self {
            http,
            cfg,
            url_generate,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.cfg.endpoint
    }

    /// Non-streaming completion via `/api/generate`. `system` is prepended
    /// to the prompt since Ollama's `/api/generate` has no dedicated
    /// system-message field (unlike `/api/chat`).
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let full_prompt = match system {
            Some(sys) if !sys.trim().is_empty() => format!("{sys}\n\n{prompt}"),
            _ => prompt.to_string(),
        };

        let body = GenerateRequest {
            model: &self.cfg.model,
            prompt: &full_prompt,
            stream: false,
            options: Some(GenerateOptions {
                temperature: self.cfg.temperature,
                top_p: self.cfg.top_p,
                num_predict: self.cfg.max_tokens,
            }),
        };

        debug!("POST {}", self.url_generate);
        let resp = self
            .http
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdaptersError::Timeout(self.url_generate.clone())
                } else {
                    AdaptersError::from(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(AdaptersError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        let out: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AdaptersError::Decode(format!("{e}; expected stream=false body")))?;

        if out.response.trim().is_empty() {
            return Err(AdaptersError::EmptyOutput);
        }
        Ok(out.response)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(default)]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
