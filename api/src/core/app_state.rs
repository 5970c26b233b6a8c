//! Shared application state and boot-time configuration.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use catalog_store::{Catalog, ConversationStore, InMemoryCatalog, InMemoryStore};
use event_llm::{Adapters, LlmAdapters};

/// Boot-time configuration, read once from the environment (§6).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: workflow_core::Env,
    pub bind_addr: String,
    pub auth_enabled: bool,
    pub auth_mode: Option<String>,
    pub api_key: Option<String>,
    pub enable_dangerous_endpoints: bool,
    pub dev_test_mode: bool,
    pub hil_all_llm_replies: bool,
    pub fallback_diagnostics: bool,
    pub detection_mode: String,
    pub frontend_base_url: String,
    pub allowed_origins: Vec<String>,
    pub request_size_limit_kb: u64,
    pub rate_limit_rps: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: &'static str },
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = workflow_core::Env::from_env();
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let auth_enabled = env_flag("AUTH_ENABLED", false);
        let api_key = std::env::var("API_KEY").ok().filter(|s| !s.is_empty());
        if auth_enabled && api_key.is_none() {
            return Err(ConfigError::MissingEnv("API_KEY"));
        }
        let enable_dangerous_endpoints = env_flag("ENABLE_DANGEROUS_ENDPOINTS", false);
        let frontend_base_url = std::env::var("FRONTEND_BASE_URL").unwrap_or_else(|_| "https://venue.example".to_string());
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let request_size_limit_kb = std::env::var("REQUEST_SIZE_LIMIT_KB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);
        let rate_limit_rps = std::env::var("RATE_LIMIT_RPS").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        let auth_mode = std::env::var("AUTH_MODE").ok().filter(|s| !s.is_empty());
        let dev_test_mode = env_flag("DEV_TEST_MODE", false);
        let hil_all_llm_replies = env_flag("OE_HIL_ALL_LLM_REPLIES", false);
        let fallback_diagnostics = env_flag("OE_FALLBACK_DIAGNOSTICS", false);
        let detection_mode = std::env::var("DETECTION_MODE").unwrap_or_else(|_| "unified".to_string());

        Ok(Self {
            env,
            bind_addr,
            auth_enabled,
            auth_mode,
            api_key,
            enable_dangerous_endpoints,
            dev_test_mode,
            hil_all_llm_replies,
            fallback_diagnostics,
            detection_mode,
            frontend_base_url,
            allowed_origins,
            request_size_limit_kb,
            rate_limit_rps,
        })
    }
}

/// Shared state for every handler, cloned cheaply per request via `Arc`.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ConversationStore>,
    pub catalog: Arc<Catalog>,
    pub adapters: Arc<Adapters>,
    /// One lock per conversation thread, so two inbound messages on the
    /// same thread never race through the step loop concurrently (§5).
    thread_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    pub async fn bootstrap(config: AppConfig) -> Result<Arc<Self>, ConfigError> {
        let store = InMemoryStore::new();
        let events = store.events_handle();
        let venue_config = catalog_store::model::VenueConfig::default();
        let catalog = InMemoryCatalog::new(demo_rooms(), demo_products(), demo_menus(), venue_config, events);

        let adapters = if std::env::var("LLM_PROVIDER").is_ok() || std::env::var("INTENT_MODEL").is_ok() {
            let intent = event_llm::config_intent().map_err(|_| ConfigError::MissingEnv("INTENT_MODEL"))?;
            let entity = event_llm::config_entity().map_err(|_| ConfigError::MissingEnv("ENTITY_MODEL"))?;
            let verbalize = event_llm::config_verbalize().map_err(|_| ConfigError::MissingEnv("VERBALIZE_MODEL"))?;
            let live = LlmAdapters::new(intent, entity, verbalize, None).map_err(|_| ConfigError::InvalidValue {
                var: "LLM_PROVIDER",
                reason: "failed to construct LLM adapters",
            })?;
            Adapters::Live(live)
        } else {
            Adapters::Stub(event_llm::StubAdapters::new())
        };

        Ok(Arc::new(Self {
            config,
            store: Arc::new(ConversationStore::InMemory(store)),
            catalog: Arc::new(Catalog::InMemory(catalog)),
            adapters: Arc::new(adapters),
            thread_locks: Mutex::new(HashMap::new()),
        }))
    }

    /// Returns the per-thread mutex, creating it on first use.
    pub async fn lock_for_thread(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.thread_locks.lock().await;
        locks.entry(thread_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

/// Static bootstrap data for the in-memory catalog. A persistent backend
/// would load this from storage instead; until one exists, this is the
/// venue's entire room/product/menu table.
fn demo_rooms() -> Vec<catalog_store::model::Room> {
    use std::collections::BTreeMap;
    vec![
        catalog_store::model::Room {
            room_id: "room-garden".to_string(),
            name: "Garden Hall".to_string(),
            capacity: 120,
            layout_capacities: BTreeMap::from([("banquet".to_string(), 90), ("theatre".to_string(), 120)]),
            amenities: vec!["projector".to_string(), "terrace".to_string()],
            accessibility: vec!["wheelchair".to_string()],
            rate: 1800.0,
            rate_inclusions: vec!["tables".to_string(), "chairs".to_string()],
        },
        catalog_store::model::Room {
            room_id: "room-atrium".to_string(),
            name: "Atrium".to_string(),
            capacity: 40,
            layout_capacities: BTreeMap::from([("banquet".to_string(), 30), ("theatre".to_string(), 40)]),
            amenities: vec!["projector".to_string()],
            accessibility: vec!["wheelchair".to_string()],
            rate: 650.0,
            rate_inclusions: vec!["tables".to_string(), "chairs".to_string()],
        },
    ]
}

fn demo_products() -> Vec<catalog_store::model::Product> {
    use catalog_store::model::ProductUnit;
    vec![
        catalog_store::model::Product {
            sku: "catering-standard".to_string(),
            name: "Standard Catering".to_string(),
            price: 45.0,
            unit: ProductUnit::PerPerson,
        },
        catalog_store::model::Product {
            sku: "av-package".to_string(),
            name: "AV Package".to_string(),
            price: 250.0,
            unit: ProductUnit::PerEvent,
        },
    ]
}

fn demo_menus() -> Vec<catalog_store::model::Menu> {
    vec![catalog_store::model::Menu {
        menu_id: "menu-seasonal".to_string(),
        name: "Seasonal Tasting Menu".to_string(),
        items: vec!["Starter".to_string(), "Main".to_string(), "Dessert".to_string()],
        price_per_person: Some(68.0),
    }]
}
