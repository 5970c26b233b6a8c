//! Step 5 — Negotiation Close (§4.6.5).

use event_llm::types::HardFact;
use event_llm::FactsBundle;
use event_routing::{ChangeInputs, ChangeType};

use catalog_store::model::{HilTaskType, NegotiationPendingDecision, Step};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};
use crate::steps::support::apply_side_effects;

/// A date-change reply takes precedence over billing capture: checked
/// before anything else merges billing fields from this message.
fn looks_like_date_change(ctx: &StepContext<'_>) -> bool {
    ctx.signals.date_signal.is_some()
}

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    if looks_like_date_change(ctx) {
        ctx.event.negotiation_pending_decision = None;
        return Ok(StepDecision::Detour {
            target: Step::DateConfirmation,
            caller_step: Step::NegotiationClose,
        });
    }

    let history = super::support::history_text(ctx.conversation);
    let entity = ctx.adapters.extract_entities(&history, &msg.body).await?;

    let room_changed = entity.room.is_some() && entity.room.as_deref() != ctx.event.locked_room_id.as_deref();
    let requirements_changed = entity.participants.is_some() && entity.participants != ctx.event.participants_count;
    let products = ctx.catalog.products().await;
    let adds = super::support::detect_catalog_item_adds(&msg.body, &products);

    let inputs = ChangeInputs {
        date_changed: false,
        room_changed,
        requirements_changed,
        products_add: adds,
    };
    let routing = event_routing::classify_and_route(Step::NegotiationClose, &inputs);
    if !matches!(routing.change, ChangeType::None) {
        apply_side_effects(ctx.event, &routing.side_effects);
        // A structural change clears any pending HIL summary — it no
        // longer describes what the client is now asking for.
        ctx.event.negotiation_pending_decision = None;
        return Ok(StepDecision::Detour {
            target: routing.target,
            caller_step: Step::NegotiationClose,
        });
    }

    if let Some(p) = entity.participants {
        ctx.event.participants_count = Some(p);
    }

    if ctx.signals.is_counter_offer {
        ctx.event.negotiation_counter_count += 1;
        if ctx.event.negotiation_counter_count > ctx.venue_config.negotiation_max_counter_offers {
            let draft = Draft::for_approval(
                "Thanks for your patience — let me bring a colleague in to finalize the details with you.",
                format!(
                    "Counter-offer ceiling reached ({} attempts) on thread {}",
                    ctx.event.negotiation_counter_count, ctx.conversation.thread_id
                ),
                HilTaskType::TooManyAttempts,
            );
            return Ok(StepDecision::Halt(draft));
        }
        return Ok(StepDecision::Detour {
            target: Step::OfferPreparation,
            caller_step: Step::NegotiationClose,
        });
    }

    if ctx.signals.is_rejection {
        ctx.event.offer_accepted = false;
        ctx.event.negotiation_pending_decision = None;
        let body = "Understood — thank you for letting us know. Feel free to reach back out if plans change.";
        return Ok(StepDecision::Halt(Draft::released(body)));
    }

    // Billing captured from this message merges before the pending-HIL
    // check, never dropped even if it arrives on its own.
    if let Some(fragment) = &entity.billing {
        if fragment.name.is_some() {
            ctx.event.billing_details.name = fragment.name.clone();
        }
        if fragment.company.is_some() {
            ctx.event.billing_details.company = fragment.company.clone();
        }
        if fragment.street.is_some() {
            ctx.event.billing_details.street = fragment.street.clone();
        }
        if fragment.postal_code.is_some() {
            ctx.event.billing_details.postal_code = fragment.postal_code.clone();
        }
        if fragment.city.is_some() {
            ctx.event.billing_details.city = fragment.city.clone();
        }
        if fragment.country.is_some() {
            ctx.event.billing_details.country = fragment.country.clone();
        }
    }

    if ctx.event.negotiation_pending_decision.is_some() {
        // Already summarized and waiting on the manager; nothing new to do.
        return Ok(StepDecision::Halt(Draft::released(
            "Your booking is with our team for final confirmation.",
        )));
    }

    let accepted = ctx.signals.is_acceptance || ctx.signals.is_confirmation || ctx.conversation.extras.intake_negotiation_accept;
    if !accepted {
        return Ok(StepDecision::Halt(Draft::released(
            "Could you confirm whether you'd like to proceed with this offer, or let us know what you'd like changed?",
        )));
    }
    ctx.conversation.extras.intake_negotiation_accept = false;

    if !ctx.event.billing_details.is_complete() {
        ctx.event.billing_requirements.awaiting_billing_for_accept = true;
        let missing = ctx.event.billing_details.missing_fields().join(", ");
        return Ok(StepDecision::Halt(Draft::released(format!(
            "Wonderful — to prepare the contract we still need your {missing}."
        ))));
    }
    ctx.event.billing_requirements.awaiting_billing_for_accept = false;
    ctx.event.offer_accepted = true;

    let total_line = ctx
        .event
        .offer_line_items
        .iter()
        .map(|(sku, qty)| format!("{qty}x {sku}"))
        .collect::<Vec<_>>()
        .join(", ");
    let summary_markdown = format!(
        "Booking ready to confirm — thread {}\nLine items: {}\nBilling: {:?}",
        ctx.conversation.thread_id, total_line, ctx.event.billing_details
    );
    let summary_body = "Thank you — we're finalizing your booking now and will confirm shortly.".to_string();

    let task_id = services::stable_uuid(&format!("{}:{}", ctx.conversation.thread_id, ctx.event.offer_sequence)).to_string();
    ctx.event.negotiation_pending_decision = Some(NegotiationPendingDecision {
        summary_body: summary_body.clone(),
        summary_body_markdown: summary_markdown.clone(),
        task_id: task_id.clone(),
    });
    ctx.event.push_audit(
        Step::NegotiationClose,
        "offer_accepted",
        serde_json::json!({ "task_id": task_id }),
    );

    let mut bundle = FactsBundle::default();
    if let Some(date) = ctx.event.event_date {
        bundle.push(HardFact::Date(date.format("%d.%m.%Y").to_string()));
    }
    bundle.deterministic_body = summary_body;
    let verbalized = ctx.verbalize(&bundle, Step::NegotiationClose, "acceptance acknowledged").await;

    let mut draft = Draft::for_approval(verbalized.body, summary_markdown, HilTaskType::AiReplyApproval);
    draft.fallback = verbalized.fallback;
    Ok(StepDecision::Halt(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_store::model::{Conversation, Event, VenueConfig};
    use catalog_store::{Catalog, InMemoryCatalog};
    use chrono::{NaiveDate, Utc};
    use event_detection::UnifiedSignals;
    use event_llm::{Adapters, StubAdapters};
    use event_llm::types::EntityExtraction;
    use event_verbalizer::VerbalizerTone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn catalog() -> Catalog {
        Catalog::InMemory(InMemoryCatalog::new(vec![], vec![], vec![], VenueConfig::default(), Arc::new(RwLock::new(HashMap::new()))))
    }

    #[tokio::test]
    async fn counter_offer_beyond_ceiling_escalates_to_hil() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        event.negotiation_counter_count = 3;
        let catalog = catalog();
        let stub = StubAdapters::new();
        stub.push_entity(EntityExtraction::default());
        let adapters = Adapters::Stub(stub);
        let signals = UnifiedSignals {
            is_counter_offer: true,
            ..Default::default()
        };
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
        let msg = InboundMessage::new("Could you do CHF 60 instead?", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();
        match decision {
            StepDecision::Halt(draft) => {
                assert_eq!(draft.task_type, Some(HilTaskType::TooManyAttempts));
            }
            other => panic!("expected too-many-attempts HIL, got {other:?}"),
        }
    }
}
