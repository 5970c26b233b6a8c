//! Unified Detection (C3): merges pre-filter heuristics, regex/keyword
//! matchers, and LLM classification into one [`signals::UnifiedSignals`]
//! bundle per inbound message.
//!
//! Nothing here talks to the catalog, the store, or the step handlers —
//! it only turns message text plus an [`event_llm::types::IntentSignal`]
//! into one typed signal bundle that `event-routing` and `workflow-core`
//! consume.

pub mod keyword;
pub mod merge;
pub mod prefilter;
pub mod signals;

pub use merge::{detect, detect_deterministic_only};
pub use signals::{DateSignal, UnifiedSignals};
