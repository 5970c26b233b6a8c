//! Integration tests that invoke a step handler's `handle()` directly
//! rather than going through `Orchestrator::handle_inbound`.
//!
//! Two of these scenarios are deliberately handler-level rather than
//! full-tick: a date-bearing message arriving at `NegotiationClose`
//! detours to `DateConfirmation` and, on any subsequent tick, the very
//! same `UnifiedSignals.date_signal` would fire `looks_like_date_change`
//! again once control returns — a real multi-hop cycle the orchestrator's
//! `MAX_STEP_HOPS` guard is there to catch, not something to route around
//! in a test. The cross-client room conflict reuses the same "arrived via
//! a date detour" entry condition step 3 checks for, so it is exercised
//! the same way.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use catalog_store::{Catalog, ChangeDetourMarker, Conversation, Event, InMemoryCatalog, Room, Step, VenueConfig};
use event_detection::signals::DateSignal;
use event_detection::UnifiedSignals;
use event_llm::types::EntityExtraction;
use event_llm::{Adapters, AdaptersError, StubAdapters};
use event_verbalizer::VerbalizerTone;
use workflow_core::context::StepContext;
use workflow_core::decision::{InboundMessage, StepDecision};
use workflow_core::steps::{step3_room_availability, step4_offer_preparation, step5_negotiation_close, step6_transition_checkpoint};

fn empty_catalog() -> Catalog {
    Catalog::InMemory(InMemoryCatalog::new(vec![], vec![], vec![], VenueConfig::default(), Arc::new(RwLock::new(HashMap::new()))))
}

fn sample_room(room_id: &str, capacity: u32, rate: f64) -> Room {
    Room {
        room_id: room_id.to_string(),
        name: room_id.to_string(),
        capacity,
        layout_capacities: Default::default(),
        amenities: vec![],
        accessibility: vec![],
        rate,
        rate_inclusions: vec![],
    }
}

#[tokio::test]
async fn date_change_at_negotiation_close_detours_and_drops_the_pending_summary() {
    let mut conversation = Conversation::new("t1", "a@b.com");
    conversation.current_step = Step::NegotiationClose;

    let mut event = Event::new("ev1", "c1", "t1");
    event.negotiation_pending_decision = Some(catalog_store::NegotiationPendingDecision {
        summary_body: "Thank you — we're finalizing your booking now.".into(),
        summary_body_markdown: "Booking ready to confirm".into(),
        task_id: "task-1".into(),
    });

    let catalog = empty_catalog();
    // No adapter calls happen on this path — `looks_like_date_change` short
    // circuits before `extract_entities` is ever reached.
    let adapters = Adapters::Stub(StubAdapters::new());
    let signals = UnifiedSignals {
        date_signal: Some(DateSignal {
            raw: "2026-10-03".to_string(),
            iso: NaiveDate::from_ymd_opt(2026, 10, 3),
            is_relative: false,
        }),
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
    let msg = InboundMessage::new("Actually, could we move this to 2026-10-03 instead?", Utc::now());

    let decision = step5_negotiation_close::handle(&mut ctx, &msg).await.unwrap();
    match decision {
        StepDecision::Detour { target, caller_step } => {
            assert_eq!(target, Step::DateConfirmation);
            assert_eq!(caller_step, Step::NegotiationClose);
        }
        other => panic!("expected a detour to date confirmation, got {other:?}"),
    }
    assert!(ctx.event.negotiation_pending_decision.is_none(), "a date change invalidates the pending summary");
}

#[tokio::test]
async fn cross_client_room_conflict_on_date_detour_offers_alternatives() {
    let mut conversation = Conversation::new("t-conflict", "a@b.com");
    // Simulates having just arrived at step 3 via a date-change detour:
    // `caller_step` is unset because the orchestrator clears it once the
    // handler returns, and `extras.change_detour` still names the reason.
    conversation.extras.change_detour = Some(ChangeDetourMarker {
        from_step: Step::NegotiationClose,
        reason: "date_change".to_string(),
    });

    let new_date = NaiveDate::from_ymd_opt(2026, 10, 3).unwrap();
    let mut event = Event::new("ev-mine", "client-mine", "t-conflict");
    event.locked_room_id = Some("Room A".to_string());
    event.event_date = Some(new_date);
    event.participants_count = Some(20);

    // Someone else's confirmed booking now holds Room A on the new date.
    let mut other = Event::new("ev-other", "client-other", "t-other");
    other.status = catalog_store::EventStatus::Confirmed;
    other.locked_room_id = Some("Room A".to_string());
    other.event_date = Some(new_date);
    let events: HashMap<String, Event> = HashMap::from([("ev-other".to_string(), other)]);
    let events_handle = Arc::new(RwLock::new(events));

    // Room A is undersized once excluded from consideration on its own
    // merits, so the alternatives list surfaces only Room B.
    let rooms = vec![sample_room("Room A", 10, 400.0), sample_room("Room B", 30, 500.0)];
    let catalog = Catalog::InMemory(InMemoryCatalog::new(rooms, vec![], vec![], VenueConfig::default(), events_handle));

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
    let msg = InboundMessage::new("Great, let's lock in the new date.", Utc::now());

    let decision = step3_room_availability::handle(&mut ctx, &msg).await.unwrap();
    match decision {
        StepDecision::Halt(draft) => {
            assert!(draft.body.contains("Room A is no longer available"));
            assert!(draft.body.contains("Room B"));
            assert!(!draft.requires_approval);
        }
        other => panic!("expected a released clarification about the conflict, got {other:?}"),
    }
    assert!(ctx.event.locked_room_id.is_none());
    assert!(ctx.conversation.extras.locked_room_unavailable_on_new_date);
}

#[tokio::test]
async fn llm_unavailable_during_offer_verbalization_falls_back_to_the_deterministic_body() {
    let mut conversation = Conversation::new("t-fallback", "a@b.com");
    conversation.current_step = Step::OfferPreparation;

    let mut event = Event::new("ev-fallback", "client-fallback", "t-fallback");
    event.locked_room_id = Some("Room A".to_string());
    event.participants_count = Some(15);
    event.event_date = NaiveDate::from_ymd_opt(2026, 11, 1);

    let rooms = vec![sample_room("Room A", 40, 600.0)];
    let catalog = Catalog::InMemory(InMemoryCatalog::new(rooms, vec![], vec![], VenueConfig::default(), Arc::new(RwLock::new(HashMap::new()))));

    let stub = StubAdapters::new();
    stub.push_entity(EntityExtraction::default());
    stub.push_verbalize_err(AdaptersError::Timeout("verbalizer request timed out".to_string()));
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
        tone: VerbalizerTone::Empathetic,
    };
    let msg = InboundMessage::new("Looks good so far, what's the total?", Utc::now());

    let decision = step4_offer_preparation::handle(&mut ctx, &msg).await.unwrap();
    match decision {
        StepDecision::Halt(draft) => {
            assert!(draft.requires_approval);
            assert!(draft.body.contains("Room A"));
            assert!(draft.body.contains("Total:"));
            let fallback = draft.fallback.expect("an LLM exception must record a fallback reason");
            assert_eq!(fallback.trigger, event_llm::FallbackTrigger::LlmException);
        }
        other => panic!("expected an offer draft falling back to the deterministic body, got {other:?}"),
    }
}

#[tokio::test]
async fn transition_checkpoint_blocks_on_an_outstanding_deposit() {
    let mut conversation = Conversation::new("t-deposit-block", "a@b.com");
    let mut event = Event::new("ev-deposit-block", "client-deposit-block", "t-deposit-block");
    event.event_date = NaiveDate::from_ymd_opt(2026, 6, 11);
    event.locked_room_id = Some("room-a".into());
    event.requirements_hash = Some("h1".into());
    event.room_eval_hash = Some("h1".into());
    event.offer_accepted = true;
    event.deposit_state = catalog_store::DepositState {
        required: true,
        amount: Some(300.0),
        vat_included: true,
        deadline: None,
        paid: false,
        paid_at: None,
    };

    let catalog = empty_catalog();
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
    let msg = InboundMessage::new("Are we all set?", Utc::now());

    let decision = step6_transition_checkpoint::handle(&mut ctx, &msg).await.unwrap();
    match decision {
        StepDecision::Halt(draft) => assert!(draft.body.contains("deposit")),
        other => panic!("expected a halt naming the outstanding deposit, got {other:?}"),
    }
}
