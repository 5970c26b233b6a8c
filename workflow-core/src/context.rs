//! `StepContext`: the bundle a step handler needs, passed by `&mut`
//! reference instead of handlers reaching into global state (§9's
//! "state is a parameter" note).

use chrono::NaiveDate;

use catalog_store::model::{Conversation, Event, VenueConfig};
use catalog_store::Catalog;
use event_detection::UnifiedSignals;
use event_llm::{Adapters, FactsBundle};
use event_verbalizer::{VerbalizedDraft, VerbalizerTone};

/// Everything one step handler invocation needs: the mutable conversation
/// and event state it may change, read-only catalog/adapters handles, the
/// signals already computed for this message, and the "current date" the
/// orchestrator injected (never `chrono::Local::now()` read directly by a
/// handler, so replaying a message in tests is reproducible).
pub struct StepContext<'a> {
    pub conversation: &'a mut Conversation,
    pub event: &'a mut Event,
    pub catalog: &'a Catalog,
    pub adapters: &'a Adapters,
    pub signals: &'a UnifiedSignals,
    pub current_date: NaiveDate,
    pub venue_config: &'a VenueConfig,
    pub tone: VerbalizerTone,
}

impl<'a> StepContext<'a> {
    /// Runs the facts bundle through the Safety Sandwich using this
    /// context's adapters and tone.
    pub async fn verbalize(
        &self,
        bundle: &FactsBundle,
        step: catalog_store::model::Step,
        prompt_context: impl Into<String>,
    ) -> VerbalizedDraft {
        event_verbalizer::verbalize(self.adapters, bundle, self.tone, step, prompt_context).await
    }
}
