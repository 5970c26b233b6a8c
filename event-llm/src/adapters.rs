//! Shared adapters facade with three active roles: `intent`, `entity`, `verbalize`.
//!
//! - Lives in the same Tokio runtime as the caller; construct once, wrap in
//!   `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per resolved config (provider+endpoint+
//!   model+key+timeout) so repeated calls don't rebuild `reqwest::Client`s.
//! - Returns typed [`IntentSignal`]/[`EntityExtraction`] by asking the model
//!   for JSON and decoding it; a malformed response is an
//!   [`AdaptersError::Decode`], which callers turn into a [`FallbackReason`].

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Instant,
};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{AdaptersError, Result};
use crate::health::{HealthService, HealthStatus};
use crate::provider_config::LlmModelConfig;
use crate::providers::LlmClient;
use crate::stub::StubAdapters;
use crate::types::{EntityExtraction, IntentSignal};

const INTENT_SYSTEM_PROMPT: &str = "You classify a single inbound venue-booking message. \
Reply with ONLY a compact JSON object matching the requested schema, no prose, no markdown fences.";

const ENTITY_SYSTEM_PROMPT: &str = "You extract structured booking entities from a venue-booking \
conversation. Reply with ONLY a compact JSON object matching the requested schema, no prose, no \
markdown fences. Omit fields you did not find rather than guessing.";

/// Shared adapters service managing the **intent**, **entity**, and
/// **verbalize** roles.
#[derive(Debug)]
pub struct LlmAdapters {
    intent: LlmModelConfig,
    entity: LlmModelConfig,
    verbalize: LlmModelConfig,

    clients: RwLock<HashMap<ClientKey, Arc<LlmClient>>>,
    health: HealthService,
}

impl LlmAdapters {
    pub fn new(
        intent: LlmModelConfig,
        entity: LlmModelConfig,
        verbalize: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self> {
        info!(
            intent.provider = %intent.provider,
            intent.model = %intent.model,
            entity.provider = %entity.provider,
            entity.model = %entity.model,
            verbalize.provider = %verbalize.provider,
            verbalize.model = %verbalize.model,
            "LlmAdapters initialized"
        );

        Ok(Self {
            intent,
            entity,
            verbalize,
            clients: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Classifies intent + acceptance/rejection/question signals for one message.
    pub async fn classify_intent(
        &self,
        thread_history: &str,
        latest_message: &str,
    ) -> Result<IntentSignal> {
        let started = Instant::now();
        let prompt = format!(
            "Conversation so far:\n{thread_history}\n\nLatest message:\n{latest_message}\n\n\
Schema: {{\"intent\":\"event_request|change_request|negotiation|other\",\"is_question\":bool,\
\"is_acceptance\":bool,\"is_rejection\":bool,\"is_change_request\":bool,\"is_confirmation\":bool,\
\"confidence\":0.0-1.0,\"qna_types\":[\"catering|pricing|room_features|site_visit|logistics|general\"],\
\"room_preference\":string|null,\"secondary\":[\"event_request|change_request|negotiation|other\"],\
\"start_time\":string|null,\"end_time\":string|null}}"
        );

        let cli = self.get_or_init(&self.intent).await?;
        let raw = cli.generate(&prompt, Some(INTENT_SYSTEM_PROMPT)).await?;
        let signal: IntentSignal = serde_json::from_str(raw.trim())
            .map_err(|e| AdaptersError::Decode(format!("intent classifier: {e}")))?;

        info!(
            provider = %self.intent.provider,
            model = %self.intent.model,
            latency_ms = started.elapsed().as_millis(),
            "intent classification completed"
        );
        Ok(signal)
    }

    /// Extracts structured booking entities from the latest message.
    pub async fn extract_entities(
        &self,
        thread_history: &str,
        latest_message: &str,
    ) -> Result<EntityExtraction> {
        let started = Instant::now();
        let prompt = format!(
            "Conversation so far:\n{thread_history}\n\nLatest message:\n{latest_message}\n\n\
Schema: {{\"date\":string|null,\"start_time\":string|null,\"end_time\":string|null,\
\"participants\":int|null,\"room\":string|null,\"products_add\":[string],\
\"products_remove\":[string],\"billing\":{{\"name\":string|null,\"company\":string|null,\
\"street\":string|null,\"postal_code\":string|null,\"city\":string|null,\"country\":string|null}}|null,\
\"vague_month\":string|null,\"force_next_year\":bool}}"
        );

        let cli = self.get_or_init(&self.entity).await?;
        let raw = cli.generate(&prompt, Some(ENTITY_SYSTEM_PROMPT)).await?;
        let extraction: EntityExtraction = serde_json::from_str(raw.trim())
            .map_err(|e| AdaptersError::Decode(format!("entity extractor: {e}")))?;

        info!(
            provider = %self.entity.provider,
            model = %self.entity.model,
            latency_ms = started.elapsed().as_millis(),
            "entity extraction completed"
        );
        Ok(extraction)
    }

    /// Rewrites a deterministic body into prose. Returns raw text; fact
    /// preservation is verified by the caller, not here.
    pub async fn verbalize(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let started = Instant::now();
        let cli = self.get_or_init(&self.verbalize).await?;
        let out = cli.generate(user_prompt, Some(system_prompt)).await?;

        info!(
            provider = %self.verbalize.provider,
            model = %self.verbalize.model,
            latency_ms = started.elapsed().as_millis(),
            "verbalize completed"
        );
        Ok(out)
    }

    /// Health snapshot for all distinct role configs (deduplicated).
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(3);
        list.push(self.intent.clone());
        if self.entity != self.intent {
            list.push(self.entity.clone());
        }
        if self.verbalize != self.intent && self.verbalize != self.entity {
            list.push(self.verbalize.clone());
        }
        debug!(roles = list.len(), "running health checks");
        self.health.check_many(&list).await
    }

    async fn get_or_init(&self, cfg: &LlmModelConfig) -> Result<Arc<LlmClient>> {
        let key = ClientKey::from(cfg);

        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            debug!(model = %cfg.model, endpoint = %cfg.endpoint, "llm client cache hit");
            return Ok(cli);
        }

        debug!(model = %cfg.model, endpoint = %cfg.endpoint, "llm client cache miss");
        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(LlmClient::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key. `api_key` participates so distinct credentials get
/// distinct clients, but it is never logged.
#[derive(Clone, Eq, Debug)]
struct ClientKey {
    provider: crate::provider_config::LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        match &self.api_key {
            Some(k) => k.hash(state),
            None => 0usize.hash(state),
        }
        self.timeout.hash(state);
    }
}

/// Enum-dispatch wrapper so `workflow-core` can hold either a live adapters
/// service or a deterministic stub behind one type, no `Box<dyn>`.
pub enum Adapters {
    Live(LlmAdapters),
    Stub(StubAdapters),
}

impl Adapters {
    pub async fn classify_intent(
        &self,
        thread_history: &str,
        latest_message: &str,
    ) -> Result<IntentSignal> {
        match self {
            Self::Live(a) => a.classify_intent(thread_history, latest_message).await,
            Self::Stub(a) => a.classify_intent(thread_history, latest_message).await,
        }
    }

    pub async fn extract_entities(
        &self,
        thread_history: &str,
        latest_message: &str,
    ) -> Result<EntityExtraction> {
        match self {
            Self::Live(a) => a.extract_entities(thread_history, latest_message).await,
            Self::Stub(a) => a.extract_entities(thread_history, latest_message).await,
        }
    }

    pub async fn verbalize(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        match self {
            Self::Live(a) => a.verbalize(system_prompt, user_prompt).await,
            Self::Stub(a) => a.verbalize(system_prompt, user_prompt).await,
        }
    }
}
