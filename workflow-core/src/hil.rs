//! Human-in-the-loop gates and task plumbing (§4.8).
//!
//! The gates here never trust in-memory `Event` state for money or deposit
//! decisions: `deposit_gate` reloads the event from the store immediately
//! before deciding, so a payment recorded by an out-of-band webhook between
//! the tick's load and this check is never missed.

use catalog_store::error::StoreError;
use catalog_store::model::{Conversation, Event, HilPayload, HilStatus, HilTask, HilTaskType};
use catalog_store::ConversationStore;
use tracing::info;

use crate::decision::Draft;
use crate::errors::WorkflowResult;

/// Outcome of a gate check: either the booking may proceed, or it is
/// blocked with a client-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    Clear,
    Blocked { reason: String },
}

impl GateResult {
    pub fn is_clear(&self) -> bool {
        matches!(self, GateResult::Clear)
    }
}

/// Billing completeness gate, evaluated against the in-memory event —
/// billing fields are only ever written within the current tick, so there
/// is no out-of-band writer to race against.
pub fn billing_gate(event: &Event) -> GateResult {
    if event.billing_details.is_complete() {
        GateResult::Clear
    } else {
        GateResult::Blocked {
            reason: format!("missing billing details: {}", event.billing_details.missing_fields().join(", ")),
        }
    }
}

/// Deposit gate. Reloads the event from the store — the authority for
/// whether a deposit has been paid is the store at read time, not whatever
/// the in-memory `Event` happened to say when the tick started.
pub async fn deposit_gate(store: &ConversationStore, event_id: &str) -> WorkflowResult<GateResult> {
    let current = store.load_event(event_id).await.ok_or_else(|| StoreError::NotFound {
        kind: "event",
        id: event_id.to_string(),
    })?;
    if !current.deposit_state.required || current.deposit_state.gate_passed() {
        Ok(GateResult::Clear)
    } else {
        Ok(GateResult::Blocked {
            reason: "deposit payment outstanding".to_string(),
        })
    }
}

/// Enqueues a draft requiring approval as a HIL task, building the payload
/// from the draft and the event/conversation state at hand. Dedup and
/// supersede-by-`(thread_id, task_type)` semantics live in the store.
pub async fn enqueue_draft(
    store: &ConversationStore,
    conversation: &Conversation,
    event: &Event,
    draft: &Draft,
) -> WorkflowResult<HilTask> {
    let task_type = draft.task_type.unwrap_or(HilTaskType::ManualReview);
    let payload = HilPayload {
        body: draft.body.clone(),
        body_markdown: draft.body_markdown.clone(),
        event_summary: event_summary(event),
        current_step: conversation.current_step,
    };
    let task_id = services::stable_uuid(&format!(
        "{}:{}:{:?}:{}",
        conversation.thread_id, event.event_id, task_type, conversation.message_history.len()
    ))
    .to_string();
    let task = HilTask {
        task_id,
        thread_id: conversation.thread_id.clone(),
        event_id: event.event_id.clone(),
        step: conversation.current_step,
        task_type,
        payload,
        status: HilStatus::Pending,
        notes: None,
        edited_message: None,
    };
    store.enqueue_task(task.clone()).await?;
    info!(thread_id = %conversation.thread_id, task_id = %task.task_id, ?task_type, "HIL task enqueued");
    Ok(task)
}

/// A compact, one-line summary of the event for manager review screens —
/// never the full audit log, just enough to orient a human reviewer.
fn event_summary(event: &Event) -> String {
    format!(
        "event={} status={:?} date={:?} room={:?} offer_accepted={}",
        event.event_id, event.status, event.event_date, event.locked_room_id, event.offer_accepted
    )
}

/// A final-contract draft, auto-sent once billing completes after the
/// client has already accepted the offer — the one HIL draft that the
/// orchestrator enqueues outside of a step handler's own `Halt`. Edge-
/// triggered on `event.final_contract_sent`: once sent, later messages
/// (small talk, unrelated questions) never re-supersede the already-sent
/// task with a duplicate.
pub fn final_contract_draft(event: &Event, thread_id: &str) -> Option<Draft> {
    if event.final_contract_sent || !event.offer_accepted || !event.billing_details.is_complete() {
        return None;
    }
    Some(Draft::for_approval(
        "Your contract is ready to send — billing details are complete.",
        format!("Final contract ready for thread {thread_id}"),
        HilTaskType::ConfirmationMessage,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_store::model::BillingDetails;

    fn complete_billing() -> BillingDetails {
        BillingDetails {
            name: Some("Jane Doe".into()),
            company: None,
            street: Some("Main St 1".into()),
            postal_code: Some("8000".into()),
            city: Some("Zurich".into()),
            country: Some("CH".into()),
        }
    }

    #[test]
    fn billing_gate_blocks_on_missing_fields() {
        let mut event = Event::new("ev1", "c1", "t1");
        event.billing_details = BillingDetails::default();
        assert!(!billing_gate(&event).is_clear());
    }

    #[test]
    fn billing_gate_clears_on_complete_billing() {
        let mut event = Event::new("ev1", "c1", "t1");
        event.billing_details = complete_billing();
        assert!(billing_gate(&event).is_clear());
    }

    #[test]
    fn final_contract_draft_requires_acceptance_and_billing() {
        let mut event = Event::new("ev1", "c1", "t1");
        assert!(final_contract_draft(&event, "t1").is_none());
        event.offer_accepted = true;
        assert!(final_contract_draft(&event, "t1").is_none());
        event.billing_details = complete_billing();
        assert!(final_contract_draft(&event, "t1").is_some());
    }

    #[test]
    fn final_contract_draft_is_edge_triggered_not_level_triggered() {
        let mut event = Event::new("ev1", "c1", "t1");
        event.offer_accepted = true;
        event.billing_details = complete_billing();
        assert!(final_contract_draft(&event, "t1").is_some());

        event.final_contract_sent = true;
        assert!(
            final_contract_draft(&event, "t1").is_none(),
            "a later unrelated message must not re-send the contract draft"
        );
    }
}
