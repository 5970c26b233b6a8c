//! Full-tick integration tests driven through `Orchestrator::handle_inbound`.
//!
//! These exercise the whole loop (out-of-context guard, step dispatch, HIL
//! enqueueing, persistence) against `InMemoryStore`/`InMemoryCatalog` and a
//! `StubAdapters` queue, the way the step-level unit tests exercise one
//! handler at a time. Every test pins `VERBALIZER_TONE=plain` up front since
//! `Orchestrator::handle_inbound` always reads it from the environment; the
//! `#[serial]` attribute keeps that global mutation from racing across tests
//! in this binary.

use chrono::{NaiveDate, Utc};
use serial_test::serial;

use catalog_store::{Catalog, Client, ConversationStore, Event, HilTaskType, InMemoryCatalog, InMemoryStore, Product, Room, Step, VenueConfig};
use event_llm::types::{EntityExtraction, Intent, IntentSignal};
use event_llm::{Adapters, StubAdapters};
use workflow_core::Orchestrator;

fn plain_tone() {
    std::env::set_var("VERBALIZER_TONE", "plain");
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

/// Seeds a conversation/client/event and wires an `InMemoryCatalog` sharing
/// the store's event table, mirroring how `InMemoryStore::events_handle`
/// must be threaded through for room-availability lookups to see live
/// bookings (`catalog-store/src/catalog.rs`'s `SharedEvents`).
async fn seed(
    conversation: catalog_store::Conversation,
    event: Event,
    rooms: Vec<Room>,
    products: Vec<Product>,
) -> (ConversationStore, Catalog) {
    let store = InMemoryStore::new();
    store.create_conversation(conversation.clone()).await.unwrap();
    store
        .upsert_client(Client::new(event.client_id.clone(), conversation.client_email.clone()))
        .await
        .unwrap();
    store.create_event(event).await.unwrap();

    let events_handle = store.events_handle();
    let catalog = Catalog::InMemory(InMemoryCatalog::new(rooms, products, vec![], VenueConfig::default(), events_handle));
    (ConversationStore::InMemory(store), catalog)
}

#[tokio::test]
#[serial]
async fn room_lock_advances_straight_to_offer_without_a_step_three_hil_task() {
    plain_tone();

    let mut conversation = catalog_store::Conversation::new("t-room-lock", "guest@example.com");
    conversation.current_step = Step::RoomAvailability;

    let mut event = Event::new("ev-room-lock", "client-room-lock", "t-room-lock");
    event.event_date = NaiveDate::from_ymd_opt(2026, 9, 12);
    event.participants_count = Some(30);

    let (store, catalog) = seed(conversation, event, vec![sample_room("Room A", 50, 500.0)], vec![]).await;

    let stub = StubAdapters::new();
    stub.push_intent(IntentSignal {
        intent: Intent::EventRequest,
        confidence: 0.95,
        ..Default::default()
    });
    stub.push_entity(EntityExtraction::default());
    let adapters = Adapters::Stub(stub);

    let reply = Orchestrator::handle_inbound(
        &store,
        &catalog,
        &adapters,
        "t-room-lock",
        "guest@example.com",
        "We'll take Room A please.",
        Utc::now(),
        NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
    )
    .await
    .unwrap();

    assert!(reply.response.is_empty(), "an offer draft requires approval, nothing is released to the client yet");

    let saved_event = store.load_event("ev-room-lock").await.unwrap();
    assert_eq!(saved_event.locked_room_id.as_deref(), Some("Room A"));
    assert_eq!(saved_event.offer_sequence, 1);

    let pending = store.list_pending_tasks().await;
    assert_eq!(pending.len(), 1, "exactly one HIL task, from step 4, never step 3");
    assert_eq!(pending[0].task_type, HilTaskType::OfferMessage);
    assert_eq!(pending[0].step, Step::OfferPreparation);
}

#[tokio::test]
#[serial]
async fn counter_offer_past_the_ceiling_escalates_through_a_full_tick() {
    plain_tone();

    let mut conversation = catalog_store::Conversation::new("t-ceiling", "guest@example.com");
    conversation.current_step = Step::NegotiationClose;

    let mut event = Event::new("ev-ceiling", "client-ceiling", "t-ceiling");
    event.negotiation_counter_count = 3;
    event.participants_count = Some(20);

    let (store, catalog) = seed(conversation, event, vec![], vec![]).await;

    let stub = StubAdapters::new();
    stub.push_intent(IntentSignal {
        intent: Intent::ChangeRequest,
        confidence: 0.9,
        ..Default::default()
    });
    stub.push_entity(EntityExtraction::default());
    let adapters = Adapters::Stub(stub);

    let reply = Orchestrator::handle_inbound(
        &store,
        &catalog,
        &adapters,
        "t-ceiling",
        "guest@example.com",
        "Could you do CHF 60 instead?",
        Utc::now(),
        NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
    )
    .await
    .unwrap();

    assert!(reply.response.is_empty());

    let saved_event = store.load_event("ev-ceiling").await.unwrap();
    assert_eq!(saved_event.negotiation_counter_count, 4);

    let pending = store.list_pending_tasks().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_type, HilTaskType::TooManyAttempts);
    assert_eq!(pending[0].step, Step::NegotiationClose);
}

#[tokio::test]
#[serial]
async fn hybrid_room_recommendation_preserves_the_catering_lookahead_note() {
    plain_tone();

    let mut conversation = catalog_store::Conversation::new("t-hybrid", "guest@example.com");
    conversation.current_step = Step::RoomAvailability;
    conversation.extras.sequential_catering_lookahead = Some("Our catering team offers three set menus starting at CHF 45 per person.".to_string());

    let mut event = Event::new("ev-hybrid", "client-hybrid", "t-hybrid");
    event.event_date = NaiveDate::from_ymd_opt(2026, 10, 3);
    event.participants_count = Some(20);

    let (store, catalog) = seed(conversation, event, vec![sample_room("Room A", 50, 400.0)], vec![]).await;

    let stub = StubAdapters::new();
    stub.push_intent(IntentSignal {
        intent: Intent::EventRequest,
        confidence: 0.9,
        is_question: true,
        qna_types: vec![event_llm::types::QnaType::Catering],
        ..Default::default()
    });
    let adapters = Adapters::Stub(stub);

    let reply = Orchestrator::handle_inbound(
        &store,
        &catalog,
        &adapters,
        "t-hybrid",
        "guest@example.com",
        "Could you also tell us about catering options?",
        Utc::now(),
        NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
    )
    .await
    .unwrap();

    assert!(!reply.response.is_empty(), "step 3 never requires manager approval");
    assert!(reply.response.contains("Room A"));
    assert!(reply.response.contains("set menus"), "the catering lookahead note must ride along with the room recommendation");

    let saved_event = store.load_event("ev-hybrid").await.unwrap();
    assert!(saved_event.locked_room_id.is_none(), "a recommendation is not a lock — the client never named the room");
    assert_eq!(
        saved_event.room_pending_decision.as_ref().map(|p| p.candidate_room_id.as_str()),
        Some("Room A")
    );

    let saved_conversation = store.load_conversation("t-hybrid").await.unwrap();
    assert!(saved_conversation.extras.sequential_catering_lookahead.is_none(), "the note is consumed, not replayed on the next tick");

    assert!(store.list_pending_tasks().await.is_empty());
}

#[tokio::test]
async fn deposit_gate_reflects_an_out_of_band_payment_update() {
    let store = InMemoryStore::new();
    let mut event = Event::new("ev-deposit", "client-deposit", "t-deposit");
    event.deposit_state = catalog_store::DepositState {
        required: true,
        amount: Some(500.0),
        vat_included: true,
        deadline: None,
        paid: false,
        paid_at: None,
    };
    store.create_event(event.clone()).await.unwrap();
    let store = ConversationStore::InMemory(store);

    let blocked = workflow_core::hil::deposit_gate(&store, "ev-deposit").await.unwrap();
    assert!(!blocked.is_clear(), "deposit is unpaid, the gate must block");

    // A payment webhook records the deposit directly in the store, bypassing
    // the in-memory `Event` this tick started with entirely.
    let mut paid = event.clone();
    paid.deposit_state.paid = true;
    paid.deposit_state.paid_at = Some(Utc::now());
    store.save_event(paid, event.version).await.unwrap();

    let clear = workflow_core::hil::deposit_gate(&store, "ev-deposit").await.unwrap();
    assert!(clear.is_clear(), "the gate must reload from the store, not trust a stale in-memory copy");
}

#[tokio::test]
#[serial]
async fn out_of_context_reply_never_reaches_the_step_handler() {
    plain_tone();

    let mut conversation = catalog_store::Conversation::new("t-ooc", "guest@example.com");
    conversation.current_step = Step::RoomAvailability;

    let mut event = Event::new("ev-ooc", "client-ooc", "t-ooc");
    event.event_date = NaiveDate::from_ymd_opt(2026, 9, 1);
    event.participants_count = Some(10);

    let (store, catalog) = seed(conversation, event, vec![sample_room("Room A", 50, 300.0)], vec![]).await;

    // A question mark is intent evidence (`has_question_signal`), and
    // `Intent::Negotiation` doesn't satisfy `reply_matches_expected` — the
    // guard should short-circuit before step 3 ever runs, so only the
    // top-level `classify_intent` call fires and no `push_entity` is needed.
    let stub = StubAdapters::new();
    stub.push_intent(IntentSignal {
        intent: Intent::Negotiation,
        confidence: 0.4,
        ..Default::default()
    });
    let adapters = Adapters::Stub(stub);

    let reply = Orchestrator::handle_inbound(
        &store,
        &catalog,
        &adapters,
        "t-ooc",
        "guest@example.com",
        "Why is this taking so long?",
        Utc::now(),
        NaiveDate::from_ymd_opt(2026, 7, 29).unwrap(),
    )
    .await
    .unwrap();

    assert!(reply.response.contains("clarify"));
    let saved_event = store.load_event("ev-ooc").await.unwrap();
    assert!(saved_event.locked_room_id.is_none(), "step 3 never ran, so nothing could have locked a room");
}
