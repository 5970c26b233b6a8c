//! Step 6 — Transition Checkpoint (§4.6.6).

use catalog_store::model::Step;

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};

/// Names every blocker still outstanding before the booking can move to
/// final confirmation.
fn collect_blockers(ctx: &StepContext<'_>) -> Vec<&'static str> {
    let mut blockers = Vec::new();
    if ctx.event.event_date.is_none() {
        blockers.push("a confirmed date");
    }
    if ctx.event.locked_room_id.is_none() {
        blockers.push("a confirmed room");
    }
    let requirements_match = ctx.event.room_eval_hash.is_some() && ctx.event.room_eval_hash == ctx.event.requirements_hash;
    if !requirements_match {
        blockers.push("a room evaluation matching your current requirements");
    }
    if !ctx.event.offer_accepted {
        blockers.push("your acceptance of the offer");
    }
    if ctx.event.deposit_state.required && !ctx.event.deposit_state.gate_passed() {
        blockers.push("the deposit payment");
    }
    if !ctx.event.site_visit_state.resolved() {
        blockers.push("a resolved site visit");
    }
    blockers
}

pub async fn handle(ctx: &mut StepContext<'_>, _msg: &InboundMessage) -> StepResult {
    let blockers = collect_blockers(ctx);
    if !blockers.is_empty() {
        let body = format!("Before we can finalize, we still need: {}.", blockers.join(", "));
        return Ok(StepDecision::Halt(Draft::released(body)));
    }

    ctx.event.push_audit(Step::TransitionCheckpoint, "transition_ready", serde_json::json!({}));
    Ok(StepDecision::Advance(Step::EventConfirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_store::model::{Conversation, Event, VenueConfig};
    use catalog_store::{Catalog, InMemoryCatalog};
    use chrono::{NaiveDate, Utc};
    use event_detection::UnifiedSignals;
    use event_llm::{Adapters, StubAdapters};
    use event_verbalizer::VerbalizerTone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn catalog() -> Catalog {
        Catalog::InMemory(InMemoryCatalog::new(vec![], vec![], vec![], VenueConfig::default(), Arc::new(RwLock::new(HashMap::new()))))
    }

    #[tokio::test]
    async fn missing_blockers_halt_with_clarification() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        let catalog = catalog();
        let adapters = Adapters::Stub(StubAdapters::new());
        let signals = UnifiedSignals::default();
        let venue_config = VenueConfig::default();
        let mut ctx = StepContext {
            conversation: &mut conversation,
            event: &mut event,
            catalog: &catalog,
            adapters: &adapters,
            signals: &signals,
            current_date: NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
            venue_config: &venue_config,
            tone: VerbalizerTone::Plain,
        };
        let msg = InboundMessage::new("Is everything set?", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        assert!(matches!(decision, StepDecision::Halt(_)));
    }

    #[tokio::test]
    async fn all_clear_advances_to_event_confirmation() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        event.event_date = NaiveDate::from_ymd_opt(2026, 6, 11);
        event.locked_room_id = Some("room-a".into());
        event.requirements_hash = Some("h1".into());
        event.room_eval_hash = Some("h1".into());
        event.offer_accepted = true;
        let catalog = catalog();
        let adapters = Adapters::Stub(StubAdapters::new());
        let signals = UnifiedSignals::default();
        let venue_config = VenueConfig::default();
        let mut ctx = StepContext {
            conversation: &mut conversation,
            event: &mut event,
            catalog: &catalog,
            adapters: &adapters,
            signals: &signals,
            current_date: NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
            venue_config: &venue_config,
            tone: VerbalizerTone::Plain,
        };
        let msg = InboundMessage::new("Is everything set?", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        assert!(matches!(decision, StepDecision::Advance(Step::EventConfirmation)));
    }
}
