//! LLM adapters for the conversation engine: intent classification, entity
//! extraction, and verbalizing deterministic bodies into prose.
//!
//! Three things live here deliberately together: the provider clients
//! (Ollama, OpenAI-compatible), the [`adapters::LlmAdapters`] facade that
//! caches and routes between them per role, and the shared output shapes
//! ([`types::IntentSignal`], [`types::EntityExtraction`], [`types::FactsBundle`])
//! that `event-detection`, `event-routing`, and `event-verbalizer` all build
//! on. Nothing in this crate knows about conversations, steps, or the
//! catalog — it only talks to models and shapes their output.

pub mod adapters;
pub mod config;
pub mod error;
pub mod fallback;
pub mod health;
pub mod provider_config;
pub mod providers;
pub mod stub;
pub mod telemetry;
pub mod types;

pub use adapters::{Adapters, LlmAdapters};
pub use error::{AdaptersError, Result};
pub use fallback::{FallbackReason, FallbackSource, FallbackTrigger};
pub use health::{HealthService, HealthStatus};
pub use provider_config::{LlmModelConfig, LlmProvider};
pub use stub::StubAdapters;
pub use types::{BillingFragment, EntityExtraction, FactsBundle, HardFact, IntentSignal, Intent, QnaType};
