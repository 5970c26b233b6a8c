//! Step 4 — Offer Preparation (§4.6.4).

use event_llm::types::HardFact;
use event_llm::FactsBundle;

use catalog_store::model::{HilTaskType, Step};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};

/// Composes the offer body (line items + billing + menu suggestions) from
/// the event's current state. Returns `(deterministic_body, facts)`.
async fn compose_offer(ctx: &StepContext<'_>) -> (String, Vec<HardFact>) {
    let mut lines = Vec::new();
    let mut facts = Vec::new();
    let mut total = 0.0_f64;

    for (sku, qty) in &ctx.event.offer_line_items {
        let Some(product) = ctx.catalog.product(sku).await else {
            continue;
        };
        let quantity = if matches!(product.unit, catalog_store::model::ProductUnit::PerPerson) {
            ctx.event.participants_count.unwrap_or(*qty)
        } else {
            *qty
        };
        let subtotal = product.price * quantity as f64;
        total += subtotal;
        lines.push(format!(
            "{}x {} ({} {} {})",
            qty,
            product.name,
            ctx.venue_config.currency,
            product.price,
            product.unit
        ));
    }

    if let Some(room_id) = &ctx.event.locked_room_id {
        if let Some(room) = ctx.catalog.room(room_id).await {
            total += room.rate;
            facts.push(HardFact::RoomName(room.name.clone()));
            lines.insert(0, format!("{} room rental ({} {})", room.name, ctx.venue_config.currency, room.rate));
        }
    }

    facts.push(HardFact::Amount {
        value: format!("{} {:.2}", ctx.venue_config.currency, total),
        unit: "per event".to_string(),
    });
    if let Some(p) = ctx.event.participants_count {
        facts.push(HardFact::ParticipantCount(p));
    }
    if let Some(date) = ctx.event.event_date {
        facts.push(HardFact::Date(date.format("%d.%m.%Y").to_string()));
    }

    let has_menu_line = ctx
        .event
        .offer_line_items
        .keys()
        .any(|sku| ctx.catalog.menus().await.iter().any(|m| m.menu_id == *sku));
    let menu_note = if !has_menu_line {
        let menus = ctx.catalog.menus().await;
        if menus.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nYou might also consider one of our menus: {}.",
                menus.iter().map(|m| m.name.clone()).collect::<Vec<_>>().join(", ")
            )
        }
    } else {
        String::new()
    };

    let billing_note = if ctx.event.billing_details.is_complete() {
        String::new()
    } else {
        format!(
            "\n\nTo finalize, we'll still need: {}.",
            ctx.event.billing_details.missing_fields().join(", ")
        )
    };

    let mut body = format!(
        "Here is your offer:\n{}\n\nTotal: {} {:.2}{}{}",
        lines.join("\n"),
        ctx.venue_config.currency,
        total,
        billing_note,
        menu_note
    );

    if let Some(warning) = &ctx.conversation.extras.time_warning {
        body.push_str(&format!("\n\nNote: {warning}"));
    }

    (body, facts)
}

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    // Entry short-circuit: an offer is already sitting with the manager;
    // never re-emit the offer body or create a second task for it.
    if ctx.event.negotiation_pending_decision.is_some() {
        return Ok(StepDecision::Halt(Draft::released(
            "Your updated request is with our team and we'll confirm shortly.",
        )));
    }

    // Room selection alone is never offer acceptance.
    let room_choice_only = ctx.signals.room_choice_token.is_some() && ctx.signals.is_acceptance;
    let genuine_acceptance = ctx.signals.is_acceptance && !room_choice_only;

    // Increment (never replace) quantities from this message's entity
    // extraction, in case this handler is entered directly rather than
    // via the routing side effects applied upstream.
    let history = super::support::history_text(ctx.conversation);
    let entity = ctx.adapters.extract_entities(&history, &msg.body).await?;
    let products = ctx.catalog.products().await;
    for add in &entity.products_add {
        if let Some(product) = products.iter().find(|p| p.name.eq_ignore_ascii_case(add) || p.sku.eq_ignore_ascii_case(add)) {
            *ctx.event.offer_line_items.entry(product.sku.clone()).or_insert(0) += 1;
        }
    }

    if genuine_acceptance {
        if !ctx.event.billing_details.is_complete() {
            ctx.event.billing_requirements.awaiting_billing_for_accept = true;
            let missing = ctx.event.billing_details.missing_fields().join(", ");
            return Ok(StepDecision::Halt(Draft::released(format!(
                "Wonderful — to prepare the contract we still need your {missing}."
            ))));
        }
        ctx.event.billing_requirements.awaiting_billing_for_accept = false;
        return Ok(StepDecision::Advance(Step::NegotiationClose));
    }

    ctx.event.offer_sequence += 1;
    let (deterministic_body, facts) = compose_offer(ctx).await;
    let bundle = FactsBundle {
        facts,
        deterministic_body,
    };
    let verbalized = ctx.verbalize(&bundle, Step::OfferPreparation, "offer composed").await;

    ctx.event.push_audit(
        Step::OfferPreparation,
        "offer_composed",
        serde_json::json!({ "offer_sequence": ctx.event.offer_sequence }),
    );

    let mut draft = Draft::for_approval(
        verbalized.body.clone(),
        format!("Offer v{} for thread {}", ctx.event.offer_sequence, ctx.conversation.thread_id),
        HilTaskType::OfferMessage,
    );
    draft.fallback = verbalized.fallback;
    Ok(StepDecision::Halt(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_store::model::{BillingDetails, Conversation, Event, VenueConfig};
    use catalog_store::{Catalog, InMemoryCatalog};
    use chrono::{NaiveDate, Utc};
    use event_detection::UnifiedSignals;
    use event_llm::types::EntityExtraction;
    use event_llm::{Adapters, StubAdapters};
    use event_verbalizer::VerbalizerTone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn catalog() -> Catalog {
        Catalog::InMemory(InMemoryCatalog::new(vec![], vec![], vec![], VenueConfig::default(), Arc::new(RwLock::new(HashMap::new()))))
    }

    #[tokio::test]
    async fn room_choice_with_acceptance_signal_is_not_genuine_acceptance() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        let mut event = Event::new("ev1", "c1", "t1");
        // Billing already complete so a mistaken "genuine acceptance" read
        // would advance straight to Step 5 instead of merely prompting for
        // billing details — the strongest signal the test can distinguish on.
        event.billing_details = BillingDetails {
            name: Some("Jane Doe".into()),
            company: None,
            street: Some("Main St 1".into()),
            postal_code: Some("8000".into()),
            city: Some("Zurich".into()),
            country: Some("CH".into()),
        };
        let catalog = catalog();
        let stub = StubAdapters::new();
        stub.push_entity(EntityExtraction::default());
        let adapters = Adapters::Stub(stub);
        let signals = UnifiedSignals {
            room_choice_token: Some("Room B".into()),
            is_acceptance: true,
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
        let msg = InboundMessage::new("Let's proceed with Room B.", Utc::now());
        let decision = handle(&mut ctx, &msg).await.unwrap();

        assert!(
            !ctx.event.offer_accepted,
            "a room-choice message must never be read as offer acceptance"
        );
        match decision {
            StepDecision::Halt(draft) => assert_eq!(draft.task_type, Some(HilTaskType::OfferMessage)),
            other => panic!("expected the offer to be (re)composed, got {other:?}"),
        }
    }
}
