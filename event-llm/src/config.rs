//! Default model configs for the three adapter roles, loaded from env.
//!
//! Each role (`intent`, `entity`, `verbalize`) resolves its own provider,
//! model, and endpoint independently, so a deployment can run the cheap
//! intent classifier against a local Ollama model while routing the
//! verbalizer through an OpenAI-compatible one.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER` = default provider for all roles (`ollama` or `openai`), default `ollama`
//! - `{ROLE}_PROVIDER` = per-role override, `ROLE` in `INTENT`, `ENTITY`, `VERBALIZE`
//! - `{ROLE}_MODEL` = model name for that role (required)
//! - `{ROLE}_MAX_TOKENS` = optional max tokens (u32)
//! - `{ROLE}_TIMEOUT_SECS` = optional request timeout override (u64)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory when provider is `ollama`)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = bearer credential (mandatory when provider is `openai`)
//! - `OPENAI_ENDPOINT` = base URL, default `https://api.openai.com`

use crate::error::{AdaptersError, Result, env_opt_u32, must_env};
use crate::provider_config::{LlmModelConfig, LlmProvider};

fn ollama_endpoint() -> Result<String> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            port.parse::<u16>().map_err(|_| AdaptersError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(AdaptersError::MissingVar("OLLAMA_URL or OLLAMA_PORT"))
}

fn resolve_provider(role_var: &'static str) -> Result<LlmProvider> {
    let raw = std::env::var(role_var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var("LLM_PROVIDER").ok())
        .unwrap_or_else(|| "ollama".to_string());
    match raw.trim().to_ascii_lowercase().as_str() {
        "ollama" => Ok(LlmProvider::Ollama),
        "openai" => Ok(LlmProvider::OpenAi),
        other => Err(AdaptersError::UnsupportedProvider(other.to_string())),
    }
}

struct RoleDefaults {
    temperature: Option<f32>,
    top_p: Option<f32>,
    timeout_secs: u64,
}

fn resolve_role(
    role_provider_var: &'static str,
    role_model_var: &'static str,
    role_max_tokens_var: &'static str,
    role_timeout_var: &'static str,
    defaults: RoleDefaults,
) -> Result<LlmModelConfig> {
    let provider = resolve_provider(role_provider_var)?;
    let model = must_env(role_model_var)?;
    let max_tokens = env_opt_u32(role_max_tokens_var)?;
    let timeout_secs = match env_opt_u32(role_timeout_var)? {
        Some(t) => t as u64,
        None => defaults.timeout_secs,
    };

    let (endpoint, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, None),
        LlmProvider::OpenAi => {
            let endpoint = std::env::var("OPENAI_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "https://api.openai.com".to_string());
            let key = must_env("OPENAI_API_KEY")?;
            (endpoint, Some(key))
        }
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: defaults.temperature,
        top_p: defaults.top_p,
        timeout_secs: Some(timeout_secs),
    })
}

/// Config for the intent classifier role: fast, low-temperature, short timeout.
pub fn config_intent() -> Result<LlmModelConfig> {
    resolve_role(
        "INTENT_PROVIDER",
        "INTENT_MODEL",
        "INTENT_MAX_TOKENS",
        "INTENT_TIMEOUT_SECS",
        RoleDefaults {
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: 20,
        },
    )
}

/// Config for the entity extractor role: low-temperature, structured output.
pub fn config_entity() -> Result<LlmModelConfig> {
    resolve_role(
        "ENTITY_PROVIDER",
        "ENTITY_MODEL",
        "ENTITY_MAX_TOKENS",
        "ENTITY_TIMEOUT_SECS",
        RoleDefaults {
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: 20,
        },
    )
}

/// Config for the verbalizer role: warmer, prose-generating.
pub fn config_verbalize() -> Result<LlmModelConfig> {
    resolve_role(
        "VERBALIZE_PROVIDER",
        "VERBALIZE_MODEL",
        "VERBALIZE_MAX_TOKENS",
        "VERBALIZE_TIMEOUT_SECS",
        RoleDefaults {
            temperature: Some(0.6),
            top_p: Some(0.9),
            timeout_secs: 30,
        },
    )
}
