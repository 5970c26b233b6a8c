//! Provider facade w/o `async-trait` or heap trait objects.
//!
//! [`LlmClient`] is an enum-dispatch wrapper around a concrete provider
//! client, following the same house style as the git-provider facade this
//! workspace used to ship: no boxed futures, no dynamic dispatch.

pub mod ollama;
pub mod openai;

use crate::error::Result;
use crate::provider_config::{LlmModelConfig, LlmProvider};
use ollama::OllamaClient;
use openai::OpenAiClient;

/// Concrete provider client, enum-dispatched.
pub enum LlmClient {
    Ollama(OllamaClient),
    OpenAi(OpenAiClient),
}

impl LlmClient {
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => Self::Ollama(OllamaClient::new(cfg)?),
            LlmProvider::OpenAi => Self::OpenAi(OpenAiClient::new(cfg)?),
        })
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Ollama(c) => c.endpoint(),
            Self::OpenAi(c) => c.endpoint(),
        }
    }

    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        match self {
            Self::Ollama(c) => c.generate(prompt, system).await,
            Self::OpenAi(c) => c.generate(prompt, system).await,
        }
    }
}
