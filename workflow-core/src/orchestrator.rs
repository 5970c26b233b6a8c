//! The orchestrator (§4.7): owns the per-message dispatch loop, the
//! out-of-context guard, HIL task enqueueing, and the save-with-retry at
//! the end of a tick. Step handlers never call each other or the store
//! directly — they only ever return a `StepDecision` and let this loop
//! decide what happens next.

use chrono::{DateTime, NaiveDate, Utc};
use event_llm::Adapters;
use event_verbalizer::VerbalizerTone;
use tracing::{info, warn};

use catalog_store::model::{Client, Conversation, Event, HilTaskType, MessageEntry, Role, Step};
use catalog_store::{Catalog, ConversationStore};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision};
use crate::errors::{ClientOutcome, WorkflowError, WorkflowResult};
use crate::hil;
use crate::reply::{self, WorkflowReply};
use crate::steps;

/// Upper bound on how many `Advance`/`Detour`/`ReturnToCaller` hops a
/// single inbound message may cause before the loop gives up — guards
/// against a cycle between two detours that keep handing back to each
/// other.
const MAX_STEP_HOPS: usize = 12;

pub struct Orchestrator;

impl Orchestrator {
    /// Processes one inbound client message end to end and returns what
    /// the client should see. HIL-bound drafts never reach the client —
    /// the caller only learns that their message is with the team.
    pub async fn handle_inbound(
        store: &ConversationStore,
        catalog: &Catalog,
        adapters: &Adapters,
        thread_id: &str,
        client_email: &str,
        body: &str,
        received_at: DateTime<Utc>,
        current_date: NaiveDate,
    ) -> WorkflowResult<WorkflowReply> {
        let venue_config = catalog.venue_config().await?;
        let tone = VerbalizerTone::from_env();

        let mut conversation = match store.load_conversation(thread_id).await {
            Some(c) => c,
            None => {
                let c = Conversation::new(thread_id, client_email);
                store.create_conversation(c.clone()).await?;
                c
            }
        };

        let client_id = match store.load_client_by_email(client_email).await {
            Some(c) => c.client_id,
            None => {
                let client_id = services::stable_uuid(client_email).to_string();
                store.upsert_client(Client::new(client_id.clone(), client_email)).await?;
                client_id
            }
        };

        let mut event = {
            let existing = store
                .load_events_for_client(&client_id)
                .await
                .into_iter()
                .find(|e| e.thread_id == thread_id);
            match existing {
                Some(e) => e,
                None => {
                    let event_id = services::stable_uuid(&format!("{thread_id}:event")).to_string();
                    let fresh = Event::new(event_id, client_id, thread_id.to_string());
                    store.create_event(fresh.clone()).await?;
                    fresh
                }
            }
        };

        let history = steps::support::history_text(&conversation);
        let intent_signal = adapters.classify_intent(&history, body).await?;
        let signals = event_detection::detect(body, &intent_signal);

        let reply_matches_expected = matches!(conversation.current_step, Step::Intake)
            || matches!(signals.intent, event_llm::types::Intent::EventRequest | event_llm::types::Intent::ChangeRequest);
        let billing_flow_active = event.billing_requirements.awaiting_billing_for_accept;
        let out_of_context = event_routing::out_of_context_guard(
            conversation.current_step,
            &signals,
            reply_matches_expected,
            billing_flow_active,
            conversation.extras.deposit_just_paid,
        );

        let msg = InboundMessage::new(body, received_at);

        let draft = if out_of_context {
            warn!(thread_id, step = ?conversation.current_step, "reply judged out of context, asking for clarification");
            Draft::released(
                "Sorry, I want to make sure I address this correctly — could you clarify how this relates to your booking?",
            )
        } else {
            Self::run_step_loop(&mut conversation, &mut event, catalog, adapters, &signals, current_date, &venue_config, tone, &msg).await?
        };

        conversation
            .message_history
            .push(MessageEntry::new(Role::Assistant, draft.body.clone(), Utc::now()));

        let outcome = if draft.requires_approval {
            hil::enqueue_draft(store, &conversation, &event, &draft).await?;
            ClientOutcome::HilPending
        } else {
            ClientOutcome::Draft(draft.body.clone())
        };

        if let Some(final_draft) = hil::final_contract_draft(&event, thread_id) {
            if !draft.requires_approval || draft.task_type != Some(HilTaskType::ConfirmationMessage) {
                hil::enqueue_draft(store, &conversation, &event, &final_draft).await?;
                event.final_contract_sent = true;
            }
        }

        let workflow_reply = reply::build_reply(&conversation, &event, &outcome);
        Self::persist(store, conversation, event).await?;

        Ok(workflow_reply)
    }

    /// Runs the `Advance`/`Detour`/`ReturnToCaller` loop for one message,
    /// dispatching to the step handler named by `conversation.current_step`.
    async fn run_step_loop(
        conversation: &mut Conversation,
        event: &mut Event,
        catalog: &Catalog,
        adapters: &Adapters,
        signals: &event_detection::UnifiedSignals,
        current_date: NaiveDate,
        venue_config: &catalog_store::model::VenueConfig,
        tone: VerbalizerTone,
        msg: &InboundMessage,
    ) -> WorkflowResult<Draft> {
        for hop in 0..MAX_STEP_HOPS {
            let mut ctx = StepContext {
                conversation,
                event,
                catalog,
                adapters,
                signals,
                current_date,
                venue_config,
                tone,
            };

            let decision = dispatch(ctx.conversation.current_step, &mut ctx, msg).await?;
            info!(hop, step = ?ctx.conversation.current_step, ?decision, "step handler decision");

            match decision {
                StepDecision::Halt(draft) => return Ok(draft),
                StepDecision::Advance(next) => {
                    conversation.current_step = next;
                }
                StepDecision::Detour { target, caller_step } => {
                    let reason = detour_reason(caller_step, target);
                    conversation.enter_detour(target, reason);
                }
                StepDecision::ReturnToCaller => {
                    // `Conversation::return_to_caller` already ran inside
                    // the handler; nothing left to do but loop back in at
                    // whatever step it restored.
                }
            }
        }

        Err(WorkflowError::TooManyHops)
    }

    /// Applies a manager's HIL decision: approve releases the (possibly
    /// edited) draft to the client, reject records the rejection and asks
    /// the step to be retried on the next inbound message.
    pub async fn handle_hil_decision(
        store: &ConversationStore,
        task_id: &str,
        approve: bool,
        notes: Option<String>,
        edited_message: Option<String>,
    ) -> WorkflowResult<WorkflowReply> {
        let status = if approve {
            catalog_store::model::HilStatus::Approved
        } else {
            catalog_store::model::HilStatus::Rejected
        };
        let task = store.set_task_status(task_id, status, notes, edited_message).await?;

        let event = store
            .load_event(&task.event_id)
            .await
            .ok_or_else(|| WorkflowError::Internal(format!("event {} vanished behind HIL task {task_id}", task.event_id)))?;

        if !approve {
            let conversation = store
                .load_conversation(&task.thread_id)
                .await
                .ok_or_else(|| WorkflowError::UnknownThread(task.thread_id.clone()))?;
            return Ok(reply::build_reply(&conversation, &event, &ClientOutcome::HilPending));
        }

        let body = task.edited_message.clone().unwrap_or(task.payload.body.clone());
        let mut conversation = store
            .load_conversation(&task.thread_id)
            .await
            .ok_or_else(|| WorkflowError::UnknownThread(task.thread_id.clone()))?;
        conversation
            .message_history
            .push(MessageEntry::new(Role::Manager, body.clone(), Utc::now()));
        let expected_version = conversation.version;
        store.save_conversation(conversation.clone(), expected_version).await?;

        Ok(reply::build_reply(&conversation, &event, &ClientOutcome::Draft(body)))
    }

    /// Terminal transition: marks the event confirmed directly, bypassing
    /// the step loop — the UI shortcut equivalent of a manager approving
    /// every outstanding gate at once. Still goes through the same
    /// optimistic-concurrency save as a normal tick.
    pub async fn accept_booking(store: &ConversationStore, thread_id: &str) -> WorkflowResult<crate::reply::OperationResult> {
        let conversation = store
            .load_conversation(thread_id)
            .await
            .ok_or_else(|| WorkflowError::UnknownThread(thread_id.to_string()))?;
        let mut event = Self::find_event_for_thread(store, &conversation).await?;
        event.status = catalog_store::model::EventStatus::Confirmed;
        event.offer_accepted = true;
        event.push_audit(conversation.current_step, "accept_booking", serde_json::json!({}));
        let version = event.version;
        store.save_event(event.clone(), version).await?;
        Ok(crate::reply::OperationResult {
            thread_id: thread_id.to_string(),
            event_id: event.event_id,
            status: "confirmed",
        })
    }

    /// Terminal transition: marks the event cancelled directly.
    pub async fn reject_booking(store: &ConversationStore, thread_id: &str) -> WorkflowResult<crate::reply::OperationResult> {
        let conversation = store
            .load_conversation(thread_id)
            .await
            .ok_or_else(|| WorkflowError::UnknownThread(thread_id.to_string()))?;
        let mut event = Self::find_event_for_thread(store, &conversation).await?;
        event.status = catalog_store::model::EventStatus::Cancelled;
        event.push_audit(conversation.current_step, "reject_booking", serde_json::json!({}));
        let version = event.version;
        store.save_event(event.clone(), version).await?;
        Ok(crate::reply::OperationResult {
            thread_id: thread_id.to_string(),
            event_id: event.event_id,
            status: "cancelled",
        })
    }

    async fn find_event_for_thread(store: &ConversationStore, conversation: &Conversation) -> WorkflowResult<Event> {
        let client_id = store
            .load_client_by_email(&conversation.client_email)
            .await
            .ok_or_else(|| WorkflowError::Internal(format!("client vanished for thread {}", conversation.thread_id)))?
            .client_id;
        store
            .load_events_for_client(&client_id)
            .await
            .into_iter()
            .find(|e| e.thread_id == conversation.thread_id)
            .ok_or_else(|| WorkflowError::Internal(format!("no event for thread {}", conversation.thread_id)))
    }

    /// Saves conversation and event with a single optimistic-concurrency
    /// retry: a conflict reloads the freshest row, re-applies nothing
    /// (the step logic already ran), and retries the save once more
    /// before giving up.
    async fn persist(store: &ConversationStore, conversation: Conversation, event: Event) -> WorkflowResult<()> {
        let conv_version = conversation.version;
        let thread_id = conversation.thread_id.clone();
        if let Err(err) = store.save_conversation(conversation.clone(), conv_version).await {
            warn!(thread_id, %err, "conversation save conflict, retrying once");
            let latest = store
                .load_conversation(&thread_id)
                .await
                .ok_or_else(|| WorkflowError::UnknownThread(thread_id.clone()))?;
            store.save_conversation(conversation, latest.version).await?;
        }

        let event_version = event.version;
        let event_id = event.event_id.clone();
        if let Err(err) = store.save_event(event.clone(), event_version).await {
            if matches!(err, catalog_store::StoreError::NotFound { kind: "event", .. }) && store.load_event(&event_id).await.is_none() {
                // `step1_intake`'s fresh-event-reuse path (§3) builds a new
                // `Event` in place rather than inserting it through the
                // store first — this is its first-ever save, not a
                // concurrency conflict.
                store.create_event(event).await?;
                return Ok(());
            }
            warn!(event_id, %err, "event save conflict, retrying once");
            let latest = store
                .load_event(&event_id)
                .await
                .ok_or_else(|| WorkflowError::Internal(format!("event {event_id} vanished mid-tick")))?;
            store.save_event(event, latest.version).await?;
        }

        Ok(())
    }
}

fn detour_reason(caller_step: Step, target: Step) -> &'static str {
    match target {
        Step::DateConfirmation if caller_step != Step::DateConfirmation => "date_change",
        Step::RoomAvailability => "requirements_change",
        Step::OfferPreparation => "products_change",
        _ => "change",
    }
}

async fn dispatch(step: Step, ctx: &mut StepContext<'_>, msg: &InboundMessage) -> crate::decision::StepResult {
    match step {
        Step::Intake => steps::step1_intake::handle(ctx, msg).await,
        Step::DateConfirmation => steps::step2_date_confirmation::handle(ctx, msg).await,
        Step::RoomAvailability => steps::step3_room_availability::handle(ctx, msg).await,
        Step::OfferPreparation => steps::step4_offer_preparation::handle(ctx, msg).await,
        Step::NegotiationClose => steps::step5_negotiation_close::handle(ctx, msg).await,
        Step::TransitionCheckpoint => steps::step6_transition_checkpoint::handle(ctx, msg).await,
        Step::EventConfirmation => steps::step7_event_confirmation::handle(ctx, msg).await,
    }
}
