//! Step 1 — Intake (§4.6.1).

use catalog_store::model::{Event, MessageEntry, Role, Step};
use event_llm::types::Intent;
use event_routing::{ChangeInputs, ChangeType};
use tracing::{debug, info};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};
use crate::steps::support::{
    apply_side_effects, compute_requirements_hash, detect_catalog_item_adds, history_text, is_short_acceptance_reply,
};
use catalog_store::model::HilTaskType;

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    ctx.conversation
        .message_history
        .push(MessageEntry::new(Role::User, msg.body.clone(), msg.received_at));

    // Heuristic upgrade: short acceptance replies are pinned straight to
    // Step 5 without running a full intent classification.
    if is_short_acceptance_reply(&msg.body) {
        ctx.conversation.extras.intake_negotiation_accept = true;
        ctx.event.push_audit(
            Step::Intake,
            "intake_negotiation_accept",
            serde_json::json!({ "body": msg.body }),
        );
        return Ok(StepDecision::Advance(Step::NegotiationClose));
    }

    let history = history_text(ctx.conversation);
    let intent_signal = ctx.adapters.classify_intent(&history, &msg.body).await?;

    if intent_signal.confidence < 0.85 || matches!(intent_signal.intent, Intent::Other) {
        info!(confidence = intent_signal.confidence, intent = ?intent_signal.intent, "low-confidence intent, routing to manual review");
        let draft = Draft::for_approval(
            "Thanks for your message — I'll follow up shortly.",
            format!(
                "Manual review requested: confidence {:.2}, intent {:?}",
                intent_signal.confidence, intent_signal.intent
            ),
            HilTaskType::ManualReview,
        );
        return Ok(StepDecision::Halt(draft));
    }

    let products = ctx.catalog.products().await;
    let adds = detect_catalog_item_adds(&msg.body, &products);

    let entity = ctx.adapters.extract_entities(&history, &msg.body).await?;

    let date_changed = match (&entity.date, ctx.event.event_date) {
        (Some(raw), Some(existing)) => {
            event_routing::dates_differ(raw, &existing.format("%Y-%m-%d").to_string(), ctx.current_date)
        }
        (Some(_), None) => true,
        _ => false,
    };

    // BUG-025 pattern: a date change arriving while billing is in flight
    // must clear the billing-flow state *before* the step change, so the
    // orchestrator's pre-route guard never forces Step 5 on top of it.
    if date_changed && ctx.event.offer_accepted && ctx.event.billing_requirements.awaiting_billing_for_accept {
        debug!("clearing billing-flow state before date-change step transition");
        ctx.event.billing_requirements.awaiting_billing_for_accept = false;
        ctx.conversation.extras.hybrid_qna_response = None;
    }

    if let Some(p) = entity.participants {
        ctx.event.participants_count = Some(p);
    }
    let new_hash = compute_requirements_hash(ctx.event.participants_count, &ctx.event.seating_layout, &ctx.event.offer_line_items);
    let requirements_changed = ctx.event.requirements_hash.as_deref() != Some(new_hash.as_str());
    if requirements_changed {
        ctx.event.room_eval_hash = None;
    }
    ctx.event.requirements_hash = Some(new_hash);

    let new_date_iso = entity
        .date
        .as_deref()
        .and_then(|raw| event_routing::normalize_date_to_iso(raw, ctx.current_date));

    if ctx.event.must_start_fresh(new_date_iso, ctx.signals.is_change_request) {
        info!(thread_id = %ctx.conversation.thread_id, "starting a fresh event for this client");
        let fresh_id = services::stable_uuid(&format!("{}:{}", ctx.conversation.thread_id, msg.received_at.timestamp())).to_string();
        let client_id = ctx.event.client_id.clone();
        let thread_id = ctx.event.thread_id.clone();
        *ctx.event = Event::new(fresh_id, client_id, thread_id);
        ctx.event.push_audit(Step::Intake, "fresh_event_started", serde_json::json!({}));
    }

    if let Some(iso) = new_date_iso {
        ctx.event.event_date = Some(iso);
    }

    let inputs = ChangeInputs {
        date_changed,
        room_changed: false,
        requirements_changed,
        products_add: adds,
    };
    let routing = event_routing::classify_and_route(Step::Intake, &inputs);
    apply_side_effects(ctx.event, &routing.side_effects);

    match routing.change {
        ChangeType::Date => Ok(StepDecision::Detour {
            target: Step::DateConfirmation,
            caller_step: Step::Intake,
        }),
        ChangeType::Requirements | ChangeType::Room => Ok(StepDecision::Detour {
            target: Step::RoomAvailability,
            caller_step: Step::Intake,
        }),
        ChangeType::Products => Ok(StepDecision::Detour {
            target: Step::OfferPreparation,
            caller_step: Step::Intake,
        }),
        ChangeType::None if ctx.event.event_date.is_none() => Ok(StepDecision::Detour {
            target: Step::DateConfirmation,
            caller_step: Step::Intake,
        }),
        ChangeType::None => Ok(StepDecision::Advance(Step::RoomAvailability)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StepContext;
    use catalog_store::model::{Conversation, VenueConfig};
    use catalog_store::{Catalog, InMemoryCatalog};
    use chrono::{NaiveDate, Utc};
    use event_detection::UnifiedSignals;
    use event_llm::types::{EntityExtraction, IntentSignal};
    use event_llm::{Adapters, StubAdapters};
    use event_verbalizer::VerbalizerTone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn catalog() -> Catalog {
        Catalog::InMemory(InMemoryCatalog::new(
            vec![],
            vec![],
            vec![],
            VenueConfig::default(),
            Arc::new(RwLock::new(HashMap::new())),
        ))
    }

    #[tokio::test]
    async fn short_acceptance_pins_to_step_five_without_llm_call() {
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
        let msg = InboundMessage::new("That's fine.", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        assert!(matches!(decision, StepDecision::Advance(Step::NegotiationClose)));
        assert!(ctx.conversation.extras.intake_negotiation_accept);
    }

    #[tokio::test]
    async fn low_confidence_intent_goes_to_manual_review() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        let catalog = catalog();
        let stub = StubAdapters::new();
        stub.push_intent(IntentSignal {
            confidence: 0.2,
            ..Default::default()
        });
        let adapters = Adapters::Stub(stub);
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
        let msg = InboundMessage::new("hi there", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        match decision {
            StepDecision::Halt(draft) => {
                assert!(draft.requires_approval);
                assert_eq!(draft.task_type, Some(HilTaskType::ManualReview));
            }
            other => panic!("expected Halt(manual_review), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_date_with_no_existing_date_detours_to_date_confirmation() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        let catalog = catalog();
        let stub = StubAdapters::new();
        stub.push_intent(IntentSignal {
            intent: Intent::EventRequest,
            confidence: 0.95,
            ..Default::default()
        });
        stub.push_entity(EntityExtraction {
            date: Some("2026-06-11".to_string()),
            participants: Some(25),
            ..Default::default()
        });
        let adapters = Adapters::Stub(stub);
        let signals = UnifiedSignals::default();
        let venue_config = VenueConfig::default();
        let mut ctx = StepContext {
            conversation: &mut conversation,
            event: &mut event,
            catalog: &catalog,
            adapters: &adapters,
            signals: &signals,
            current_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            venue_config: &venue_config,
            tone: VerbalizerTone::Plain,
        };
        let msg = InboundMessage::new("We'd like 25 people on 2026-06-11.", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        match decision {
            StepDecision::Detour { target, caller_step } => {
                assert_eq!(target, Step::DateConfirmation);
                assert_eq!(caller_step, Step::Intake);
            }
            other => panic!("expected a detour to date confirmation, got {other:?}"),
        }
        assert_eq!(ctx.event.event_date, NaiveDate::from_ymd_opt(2026, 6, 11));
    }
}
